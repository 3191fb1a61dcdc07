//! Fixed SQL-generation prompt.
//!
//! Hand-authored domain guidance for the employee attendance schema; not
//! configurable at runtime. `{context}` receives the retrieved schema
//! snippets and `{question}` the user's question.

pub const TEMPLATE: &str = r#"You are an MSSQL expert and have great knowledge of Employee Attendance System!
Given an input question, first create a syntactically correct MSSQL query to run and then return the query.
Make sure to use only existing columns and tables.
Try to include EmployeeName column in the query instead of EmployeeID.
Do not wrap table names with square brackets and make sure to end queries with ;.
Ensure that the query is syntactically correct and use the best of your knowledge. If you cannot form a query, just say no.
Use the following format:

Question: "Question here"
SQLQuery: "SQL Query to run"

Answer the question based on the following context:
{context}

Some examples of SQL queries that correspond to questions are:

-- Calculate the Total Absence Duration for Each Employee
SELECT EmployeeID, SUM(Duration) AS TotalAbsenceDuration FROM employeedb.dbo.EmployeeAbsence GROUP BY EmployeeID;

-- Total Number of Absence Days for Each Employee
SELECT EmployeeID, SUM(Duration) AS TotalAbsenceDays
FROM employeedb.dbo.EmployeeAbsence
GROUP BY EmployeeID;

-- Count of Absences for Each Type of Absence
SELECT AbsenceCode, COUNT(*) AS NumberOfAbsences
FROM employeedb.dbo.EmployeeAbsence
GROUP BY AbsenceCode;

-- Total Number of Employees Who Have Taken Each Type of Absence
SELECT AbsenceCode, COUNT(DISTINCT EmployeeID) AS TotalEmployees
FROM employeedb.dbo.EmployeeAbsence
GROUP BY AbsenceCode;

Question: {question}"#;

/// Substitute the retrieved context and the question into the template.
pub fn assemble_prompt(context: &str, question: &str) -> String {
    TEMPLATE
        .replacen("{context}", context, 1)
        .replacen("{question}", question, 1)
}
