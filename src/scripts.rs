/// Script Catalog Module
///
/// The static registry of classroom PL/SQL demos. Each entry is an
/// immutable block against the canonical HR sample schema (plus the
/// classroom tables HR.DEMO_NUMBERS, HR.ID_NUMBERS and HR.STUDENTS),
/// optionally followed by read queries that surface the block's side
/// effects as tabular data.
///
/// Scripts carry no spliced-in user input; the one parameterized block in
/// the application (ID validation) takes its value as a bind variable.

/// A follow-up read query attached to a demo.
#[derive(Debug, Clone, Copy)]
pub struct FollowUpSpec {
    pub label: &'static str,
    pub sql: &'static str,
}

/// One cataloged demo: a name for the route, a human title, the block
/// text, and the follow-up queries to run after it.
#[derive(Debug, Clone, Copy)]
pub struct Demo {
    pub name: &'static str,
    pub title: &'static str,
    pub script: &'static str,
    pub follow_ups: &'static [FollowUpSpec],
}

/// Returns the full catalog in presentation order.
pub fn all() -> &'static [Demo] {
    CATALOG
}

/// Looks up one demo by its route name.
pub fn find(name: &str) -> Option<&'static Demo> {
    CATALOG.iter().find(|demo| demo.name == name)
}

static CATALOG: &[Demo] = &[
    Demo {
        name: "first-names",
        title: "Employee first names via an explicit cursor",
        script: r#"DECLARE
    CURSOR first_name_cur IS SELECT FIRST_NAME FROM HR.EMPLOYEES;
    v_first_name HR.EMPLOYEES.FIRST_NAME%TYPE;
BEGIN
    OPEN first_name_cur;
    LOOP
        FETCH first_name_cur INTO v_first_name;
        EXIT WHEN first_name_cur%NOTFOUND;
        DBMS_OUTPUT.PUT_LINE('First name: ' || v_first_name);
    END LOOP;
    CLOSE first_name_cur;
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "last-names",
        title: "Employee last names via an explicit cursor",
        script: r#"DECLARE
    CURSOR last_name_cur IS SELECT LAST_NAME FROM HR.EMPLOYEES;
    v_last_name HR.EMPLOYEES.LAST_NAME%TYPE;
BEGIN
    OPEN last_name_cur;
    LOOP
        FETCH last_name_cur INTO v_last_name;
        EXIT WHEN last_name_cur%NOTFOUND;
        DBMS_OUTPUT.PUT_LINE('Last name: ' || v_last_name);
    END LOOP;
    CLOSE last_name_cur;
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "employee-names",
        title: "Employee first and last names",
        script: r#"DECLARE
    CURSOR name_cur IS SELECT FIRST_NAME, LAST_NAME FROM HR.EMPLOYEES;
    v_first_name HR.EMPLOYEES.FIRST_NAME%TYPE;
    v_last_name  HR.EMPLOYEES.LAST_NAME%TYPE;
BEGIN
    OPEN name_cur;
    LOOP
        FETCH name_cur INTO v_first_name, v_last_name;
        EXIT WHEN name_cur%NOTFOUND;
        DBMS_OUTPUT.PUT_LINE('First name: ' || v_first_name || ', Last name: ' || v_last_name);
    END LOOP;
    CLOSE name_cur;
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "employee-details",
        title: "Employee names and salaries",
        script: r#"DECLARE
    CURSOR detail_cur IS
        SELECT FIRST_NAME, LAST_NAME, SALARY FROM HR.EMPLOYEES;
    v_first_name HR.EMPLOYEES.FIRST_NAME%TYPE;
    v_last_name  HR.EMPLOYEES.LAST_NAME%TYPE;
    v_salary     HR.EMPLOYEES.SALARY%TYPE;
BEGIN
    OPEN detail_cur;
    LOOP
        FETCH detail_cur INTO v_first_name, v_last_name, v_salary;
        EXIT WHEN detail_cur%NOTFOUND;
        DBMS_OUTPUT.PUT_LINE('First name: ' || v_first_name || ', Last name: ' || v_last_name || ', Salary: ' || v_salary);
    END LOOP;
    CLOSE detail_cur;
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "employee-emails",
        title: "Employee first names and email addresses",
        script: r#"DECLARE
    CURSOR email_cur IS SELECT FIRST_NAME, EMAIL FROM HR.EMPLOYEES;
    v_first_name HR.EMPLOYEES.FIRST_NAME%TYPE;
    v_email      HR.EMPLOYEES.EMAIL%TYPE;
BEGIN
    OPEN email_cur;
    LOOP
        FETCH email_cur INTO v_first_name, v_email;
        EXIT WHEN email_cur%NOTFOUND;
        DBMS_OUTPUT.PUT_LINE('First name: ' || v_first_name || ', Email: ' || v_email);
    END LOOP;
    CLOSE email_cur;
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "employee-phones",
        title: "Employee first names and phone numbers",
        script: r#"DECLARE
    CURSOR phone_cur IS SELECT FIRST_NAME, PHONE_NUMBER FROM HR.EMPLOYEES;
    v_first_name HR.EMPLOYEES.FIRST_NAME%TYPE;
    v_phone      HR.EMPLOYEES.PHONE_NUMBER%TYPE;
BEGIN
    OPEN phone_cur;
    LOOP
        FETCH phone_cur INTO v_first_name, v_phone;
        EXIT WHEN phone_cur%NOTFOUND;
        DBMS_OUTPUT.PUT_LINE('First name: ' || v_first_name || ', Phone: ' || v_phone);
    END LOOP;
    CLOSE phone_cur;
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "static-message",
        title: "Printing a variable and a literal",
        script: r#"DECLARE
    v_message VARCHAR2(20) := 'HELLO WORLD';
BEGIN
    DBMS_OUTPUT.PUT_LINE(v_message);
    DBMS_OUTPUT.PUT_LINE('END OF PROGRAM');
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "add-numbers",
        title: "Adding two NUMBER variables",
        script: r#"DECLARE
    v_num1 NUMBER(4,2) := 10.2;
    v_num2 NUMBER(4,2) := 20.1;
BEGIN
    DBMS_OUTPUT.PUT_LINE('THE SUM IS: ' || TO_CHAR(v_num1 + v_num2));
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "db-creation-date",
        title: "Database creation date from V$DATABASE",
        script: r#"DECLARE
    v_created V$DATABASE.CREATED%TYPE;
BEGIN
    SELECT CREATED INTO v_created FROM V$DATABASE;
    DBMS_OUTPUT.PUT_LINE('THE DATABASE WAS CREATED ON: ' || TO_CHAR(v_created, 'DDMMYYYY'));
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "db-name-and-date",
        title: "Database name and creation timestamp",
        script: r#"DECLARE
    v_name VARCHAR2(50);
    v_date DATE;
BEGIN
    SELECT NAME, CREATED INTO v_name, v_date FROM SYS.V_$DATABASE;
    DBMS_OUTPUT.PUT_LINE('The database name is: ' || v_name);
    DBMS_OUTPUT.PUT_LINE('It was created on: ' || TO_CHAR(v_date, 'YYYY-MM-DD HH24:MI:SS'));
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "employee-count",
        title: "Counting employees with SELECT INTO",
        script: r#"DECLARE
    v_total INTEGER;
BEGIN
    SELECT COUNT(*) INTO v_total FROM HR.EMPLOYEES;
    DBMS_OUTPUT.PUT_LINE('The employee total is: ' || v_total);
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "db-age-check",
        title: "Branching on the database age",
        script: r#"DECLARE
    v_created V$DATABASE.CREATED%TYPE;
BEGIN
    SELECT CREATED INTO v_created FROM V$DATABASE;

    IF (SYSDATE - v_created > 30) THEN
        DBMS_OUTPUT.PUT_LINE('THE DATABASE WAS CREATED MORE THAN 30 DAYS AGO.');
    ELSE
        DBMS_OUTPUT.PUT_LINE('THE DATABASE WAS CREATED LESS THAN 30 DAYS AGO.');
    END IF;
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "count-to-ten",
        title: "A FOR loop over 1..10",
        script: r#"BEGIN
    FOR v_num IN 1..10 LOOP
        DBMS_OUTPUT.PUT_LINE('NUMBER: ' || TO_CHAR(v_num));
    END LOOP;
END;"#,
        follow_ups: &[],
    },
    Demo {
        name: "insert-numbers",
        title: "Seeding the next ten values into HR.DEMO_NUMBERS",
        script: r#"DECLARE
    v_num NUMBER;
    v_max NUMBER;
BEGIN
    SELECT NVL(MAX(n), 0) INTO v_max FROM HR.DEMO_NUMBERS;

    v_num := v_max + 1;

    FOR i IN 1..10 LOOP
        INSERT INTO HR.DEMO_NUMBERS (n) VALUES (v_num);
        DBMS_OUTPUT.PUT_LINE('Inserted NUMBER: ' || v_num);
        v_num := v_num + 1;
    END LOOP;

    COMMIT;
END;"#,
        follow_ups: &[FollowUpSpec {
            label: "numbers",
            sql: "SELECT n FROM HR.DEMO_NUMBERS ORDER BY n",
        }],
    },
    Demo {
        name: "assign-student-emails",
        title: "Deriving emails and passwords for students without one",
        script: r#"DECLARE
    CURSOR student_cur IS
        SELECT STUDENT_ID, FIRST_NAMES, LAST_NAMES
        FROM HR.STUDENTS
        WHERE EMAIL IS NULL;

    v_student_id   HR.STUDENTS.STUDENT_ID%TYPE;
    v_first_names  HR.STUDENTS.FIRST_NAMES%TYPE;
    v_last_names   HR.STUDENTS.LAST_NAMES%TYPE;

    v_name1        VARCHAR2(50);
    v_name2        VARCHAR2(50);
    surname_words  DBMS_SQL.VARCHAR2_TABLE;
    v_surname_stem VARCHAR2(100);
    v_mail_user    VARCHAR2(100);
    v_email        VARCHAR2(100);
    v_password     VARCHAR2(100);
    v_updated      NUMBER := 0;

    FUNCTION strip_accents(p_text VARCHAR2) RETURN VARCHAR2 IS
    BEGIN
        RETURN TRANSLATE(p_text, 'áéíóúÁÉÍÓÚñÑ', 'aeiouAEIOUnN');
    END;
BEGIN
    FOR student IN student_cur LOOP
        v_updated := v_updated + 1;

        v_student_id  := student.STUDENT_ID;
        v_first_names := student.FIRST_NAMES;
        v_last_names  := student.LAST_NAMES;

        v_name1 := REGEXP_SUBSTR(v_first_names, '^\S+');
        v_name2 := REGEXP_SUBSTR(v_first_names, '\S+', 1, 2);

        v_surname_stem := '';
        FOR i IN 1 .. REGEXP_COUNT(v_last_names, '\S+') LOOP
            surname_words(i) := REGEXP_SUBSTR(v_last_names, '\S+', 1, i);
        END LOOP;

        IF surname_words.COUNT > 2 THEN
            FOR i IN 1 .. surname_words.COUNT - 1 LOOP
                v_surname_stem := v_surname_stem || surname_words(i);
            END LOOP;
        ELSE
            v_surname_stem := surname_words(1);
        END IF;

        v_mail_user := LOWER(
            SUBSTR(v_name1, 1, 1) ||
            SUBSTR(v_name2, 1, 1) ||
            strip_accents(v_surname_stem)
        );

        v_email := v_mail_user || '@modsoft.edu.ec';

        v_password := INITCAP(SUBSTR(v_name1, 1, 1) ||
                       LOWER(strip_accents(v_surname_stem))) ||
                       (LENGTH(v_mail_user) - 1);

        UPDATE HR.STUDENTS
        SET EMAIL        = v_email,
            CREATED_DATE = SYSDATE,
            CREATED_TIME = SYSTIMESTAMP,
            PASSWORD     = v_password
        WHERE STUDENT_ID = v_student_id;

        DBMS_OUTPUT.PUT_LINE('Updated ID ' || v_student_id || ' -> ' || v_email || ' / ' || v_password);
    END LOOP;

    DBMS_OUTPUT.PUT_LINE('Total students updated: ' || v_updated);
END;"#,
        follow_ups: &[
            FollowUpSpec {
                label: "updated_today",
                sql: "SELECT STUDENT_ID, EMAIL, PASSWORD
  FROM HR.STUDENTS
 WHERE TRUNC(CREATED_DATE) = TRUNC(SYSDATE)",
            },
            FollowUpSpec {
                label: "still_missing",
                sql: "SELECT COUNT(*) AS MISSING_EMAIL FROM HR.STUDENTS WHERE EMAIL IS NULL",
            },
        ],
    },
];

/// National-ID checksum validation block.
///
/// Not a catalog entry: it takes the candidate number as the `:id` bind
/// variable. Ten digits, province prefix 01-24, third digit at most 5,
/// weighted mod-10 checksum with coefficients (2,1,2,1,2,1,2,1,2) where a
/// two-digit product has 9 subtracted, verifier compared to the tenth
/// digit. Valid numbers are inserted, with DUP_VAL_ON_INDEX tolerated, and
/// every outcome prints a message line.
pub static ID_VALIDATION_SCRIPT: &str = r#"DECLARE
    v_id VARCHAR2(10) := :id;

    CURSOR id_cursor IS
        SELECT v_id AS id_number FROM dual;

    coefficients SYS.OdciNumberList := SYS.OdciNumberList(2,1,2,1,2,1,2,1,2);
    v_sum NUMBER := 0;
    v_verifier NUMBER;
    v_check_digit NUMBER;
BEGIN
    FOR rec IN id_cursor LOOP
        IF LENGTH(rec.id_number) != 10 THEN
            DBMS_OUTPUT.PUT_LINE('The ID number must have 10 digits.');
            RETURN;
        END IF;

        IF NOT REGEXP_LIKE(rec.id_number, '^\d{10}$') THEN
            DBMS_OUTPUT.PUT_LINE('The ID number contains non-numeric characters.');
            RETURN;
        END IF;

        IF TO_NUMBER(SUBSTR(rec.id_number, 1, 2)) NOT BETWEEN 1 AND 24 THEN
            DBMS_OUTPUT.PUT_LINE('Invalid province code.');
            RETURN;
        END IF;

        IF TO_NUMBER(SUBSTR(rec.id_number, 3, 1)) > 5 THEN
            DBMS_OUTPUT.PUT_LINE('Invalid third digit.');
            RETURN;
        END IF;

        v_sum := 0;
        FOR i IN 1..9 LOOP
            DECLARE
                v_digit NUMBER := TO_NUMBER(SUBSTR(rec.id_number, i, 1));
                v_product NUMBER := v_digit * coefficients(i);
            BEGIN
                IF v_product >= 10 THEN
                    v_product := v_product - 9;
                END IF;
                v_sum := v_sum + v_product;
            END;
        END LOOP;

        v_verifier := 10 - MOD(v_sum, 10);
        IF v_verifier = 10 THEN
            v_verifier := 0;
        END IF;

        v_check_digit := TO_NUMBER(SUBSTR(rec.id_number, 10, 1));

        IF v_check_digit = v_verifier THEN
            BEGIN
                INSERT INTO HR.ID_NUMBERS (ID_NUMBER) VALUES (rec.id_number);
                COMMIT;
                DBMS_OUTPUT.PUT_LINE('Valid ID number, stored: ' || rec.id_number);
            EXCEPTION
                WHEN DUP_VAL_ON_INDEX THEN
                    DBMS_OUTPUT.PUT_LINE('ID number already registered.');
                WHEN OTHERS THEN
                    DBMS_OUTPUT.PUT_LINE('Insert failed: ' || SQLERRM);
            END;
        ELSE
            DBMS_OUTPUT.PUT_LINE('Invalid check digit. Expected: ' || v_verifier);
        END IF;
    END LOOP;
END;"#;

/// Follow-up listing every stored ID number after a validation run.
pub static STORED_IDS_SQL: &str = "SELECT ID, ID_NUMBER FROM HR.ID_NUMBERS ORDER BY ID";
