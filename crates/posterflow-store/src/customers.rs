use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::{
    db::init_db,
    error::{Result, StoreError},
    types::{fmt_ts, Customer, NewCustomer},
};

/// Registry of customers. The dispatch engine resolves the WhatsApp number
/// through this store at send time; nothing else about a customer is read on
/// the dispatch path.
#[derive(Clone)]
pub struct CustomerStore {
    conn: Arc<Mutex<Connection>>,
}

/// Map a SELECT row (id, company_name, whatsapp, created_at, updated_at).
fn row_to_customer(row: &rusqlite::Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        company_name: row.get(1)?,
        whatsapp: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl CustomerStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Result<Self> {
        init_db(&conn.lock().unwrap())?;
        Ok(Self { conn })
    }

    pub fn insert(&self, new: &NewCustomer) -> Result<Customer> {
        if new.company_name.trim().is_empty() {
            return Err(StoreError::InvalidRecord(
                "companyName must be non-empty".into(),
            ));
        }

        let conn = self.conn.lock().unwrap();
        let now = fmt_ts(Utc::now());
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO customers (id, company_name, whatsapp, created_at, updated_at)
             VALUES (?1,?2,?3,?4,?4)",
            rusqlite::params![id, new.company_name, new.whatsapp, now],
        )?;
        Ok(Customer {
            id,
            company_name: new.company_name.clone(),
            whatsapp: new.whatsapp.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Look up a customer by ID. `Ok(None)` is a dangling reference, not an
    /// error — the caller decides how to surface it.
    pub fn get(&self, id: &str) -> Result<Option<Customer>> {
        let conn = self.conn.lock().unwrap();
        let customer = conn
            .query_row(
                "SELECT id, company_name, whatsapp, created_at, updated_at
                 FROM customers WHERE id = ?1",
                [id],
                row_to_customer,
            )
            .optional()?;
        Ok(customer)
    }

    pub fn list(&self) -> Result<Vec<Customer>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, company_name, whatsapp, created_at, updated_at
             FROM customers ORDER BY created_at, id",
        )?;
        let customers = stmt
            .query_map([], row_to_customer)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(customers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CustomerStore {
        let conn = Connection::open_in_memory().unwrap();
        CustomerStore::new(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn insert_and_get() {
        let store = store();
        let created = store
            .insert(&NewCustomer {
                company_name: "Acme Traders".into(),
                whatsapp: Some("9876543210".into()),
            })
            .unwrap();

        let fetched = store.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched.company_name, "Acme Traders");
        assert_eq!(fetched.whatsapp.as_deref(), Some("9876543210"));
    }

    #[test]
    fn get_missing_is_none() {
        let store = store();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn insert_rejects_blank_name() {
        let store = store();
        let result = store.insert(&NewCustomer {
            company_name: " ".into(),
            whatsapp: None,
        });
        assert!(matches!(result, Err(StoreError::InvalidRecord(_))));
    }
}
