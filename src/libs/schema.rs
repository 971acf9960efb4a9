// schema.rs

/// A table and the raw DDL fragments of its columns.
///
/// Column definitions are trusted configuration and are passed to
/// `CREATE TABLE` verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl TableSchema {
    /// File name of the CSV that seeds this table, e.g. `orders_data.csv`.
    pub fn source_file(&self) -> String {
        format!("{}_data.csv", self.name)
    }
}

pub fn create_table_sql<S: AsRef<str>>(name: &str, columns: &[S]) -> String {
    let cols: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    format!("CREATE TABLE IF NOT EXISTS {} ({})", name, cols.join(", "))
}

pub const EMPLOYEES: TableSchema = TableSchema {
    name: "employees",
    columns: &[
        "employees_id serial PRIMARY KEY",
        "first_name varchar(100) NOT NULL",
        "last_name varchar(100) NOT NULL",
        "title varchar(100) NOT NULL",
        "birth_date date NOT NULL",
        "notes text",
    ],
};

pub const CUSTOMERS: TableSchema = TableSchema {
    name: "customers",
    columns: &[
        "customer_id varchar(10) PRIMARY KEY",
        "company_name varchar(100)",
        "contact_name varchar(100)",
    ],
};

pub const ORDERS: TableSchema = TableSchema {
    name: "orders",
    columns: &[
        "order_id int PRIMARY KEY",
        "customer_id varchar(10) REFERENCES customers(customer_id)",
        "employee_id int REFERENCES employees(employees_id)",
        "order_date date NOT NULL",
        "ship_city varchar(100) NOT NULL",
    ],
};

/// The north tables in creation order; `orders` references the other two.
pub const NORTH_TABLES: [TableSchema; 3] = [EMPLOYEES, CUSTOMERS, ORDERS];
