use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tokio::sync::oneshot;

pub mod helpers;
mod migrations;
pub mod storage;

use migrations::run_migrations;
pub use storage::{keys, ItemWrite, MemoryStorage, PageStorage};

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to page store thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join page store thread: {join_err:?}");
            }
        }
    }
}

/// SQLite-backed page storage. One worker thread owns the connection; every
/// request, including a whole read-modify-write, runs there as a single task.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create page store directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("careboard-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite page store")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }
                // Another process (the other console) may hold the write lock briefly.
                if let Err(err) = conn.busy_timeout(std::time::Duration::from_secs(5)) {
                    error!("Failed to set busy timeout: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run page store migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("Page store initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Page store thread shutting down");
            })
            .with_context(|| "failed to spawn page store worker thread")?;

        ready_rx
            .recv()
            .context("page store worker exited before signaling readiness")??;

        info!("Page store initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("Page store caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to page store thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("page store thread terminated unexpectedly"))?
    }
}

fn read_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM page_storage WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("failed to read '{key}'"))
}

fn write_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO page_storage (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, Utc::now().to_rfc3339()],
    )
    .with_context(|| format!("failed to write '{key}'"))?;
    Ok(())
}

fn delete_value(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM page_storage WHERE key = ?1", params![key])
        .with_context(|| format!("failed to remove '{key}'"))?;
    Ok(())
}

#[async_trait]
impl PageStorage for Database {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.execute(move |conn| read_value(conn, &key)).await
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| write_value(conn, &key, &value))
            .await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| delete_value(conn, &key)).await
    }

    async fn update_item<F, T>(&self, key: &str, update: F) -> Result<T>
    where
        F: FnOnce(Option<&str>) -> Result<(ItemWrite, T)> + Send + 'static,
        T: Send + 'static,
    {
        let key = key.to_string();
        self.execute(move |conn| {
            // IMMEDIATE takes the write lock before reading, so a second process
            // cannot read the same snapshot and overwrite this update.
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .context("failed to open update transaction")?;

            let current = read_value(&tx, &key)?;
            let (write, output) = update(current.as_deref())?;

            match write {
                ItemWrite::Keep => {}
                ItemWrite::Set(value) => write_value(&tx, &key, &value)?,
                ItemWrite::Remove => delete_value(&tx, &key)?,
            }

            tx.commit()
                .with_context(|| format!("failed to commit update of '{key}'"))?;
            Ok(output)
        })
        .await
    }
}
