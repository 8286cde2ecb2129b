#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Category, Department, Engine, ExpenseCmd, LookupRef, MemoryObjectStore, Money, ObjectStore,
    ObjectStoreError, PaymentMethod,
};
use migration::MigratorTrait;

/// Object store double: keeps objects in memory, records every call and
/// fails deletes of the paths it was told to.
#[derive(Debug)]
pub struct RecordingStore {
    inner: MemoryObjectStore,
    puts: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    failing_deletes: Mutex<HashSet<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryObjectStore::new("http://files.test"),
            puts: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            failing_deletes: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_delete(&self, path: &str) {
        self.failing_deletes.lock().unwrap().insert(path.to_string());
    }

    pub fn puts(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn stored_paths(&self) -> Vec<String> {
        self.inner.paths()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), ObjectStoreError> {
        self.puts.lock().unwrap().push(path.to_string());
        self.inner.put(path, bytes, content_type, upsert).await
    }

    async fn delete(&self, path: &str) -> Result<(), ObjectStoreError> {
        self.deletes.lock().unwrap().push(path.to_string());
        if self.failing_deletes.lock().unwrap().contains(path) {
            return Err(ObjectStoreError::Unavailable(format!("refusing {path}")));
        }
        self.inner.delete(path).await
    }

    fn public_url(&self, path: &str) -> String {
        self.inner.public_url(path)
    }
}

pub struct Fixture {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub store: Arc<RecordingStore>,
    pub category: Category,
    pub department: Department,
    pub payment_method: PaymentMethod,
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection, Arc<RecordingStore>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let store = Arc::new(RecordingStore::new());
    let engine = Engine::builder()
        .database(db.clone())
        .object_store(store.clone())
        .build()
        .await
        .unwrap();
    (engine, db, store)
}

/// Engine with one category, department and payment method.
pub async fn fixture() -> Fixture {
    let (engine, db, store) = engine_with_db().await;
    let category = engine.find_or_create_category("อาหาร").await.unwrap();
    let department = engine.create_department("ฝ่ายขาย").await.unwrap();
    let payment_method = engine.find_or_create_payment_method("เงินสด").await.unwrap();
    Fixture {
        engine,
        db,
        store,
        category,
        department,
        payment_method,
    }
}

impl Fixture {
    /// A complete expense form.
    pub fn expense(&self, date: NaiveDate, amount: Money, description: &str) -> ExpenseCmd {
        ExpenseCmd::new(date, amount, description, "สมชาย")
            .category(LookupRef::Id(self.category.id))
            .payment_method(LookupRef::Id(self.payment_method.id))
            .department(self.department.id)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn baht(value: i64) -> Money {
    Money::new(value * 100)
}
