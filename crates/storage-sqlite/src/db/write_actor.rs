use super::DbPool;
use crate::errors::StorageError;
use budgetledger_core::errors::{DatabaseError, Result};
use diesel::SqliteConnection;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tokio::sync::{mpsc, oneshot};

/// A unit of work for the writer. It runs inside one `BEGIN IMMEDIATE`
/// transaction; returning `Err` rolls back everything it wrote.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type AnyBox = Box<dyn Any + Send + 'static>;
type Envelope = (Job<AnyBox>, oneshot::Sender<Result<AnyBox>>);

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<Envelope>,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

/// Runs `job`, turning a panic into an error so the surrounding transaction
/// rolls back and the writer survives.
fn run_guarded<T>(job: Job<T>, conn: &mut SqliteConnection) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(|| job(conn))).unwrap_or_else(|payload| {
        log::error!("Write job panicked: {}", panic_message(payload.as_ref()));
        Err(DatabaseError::Internal("Write job panicked".to_string()).into())
    })
}

fn writer_gone() -> budgetledger_core::Error {
    DatabaseError::TransactionFailed("The database writer is not running".to_string()).into()
}

impl WriteHandle {
    /// Executes `job` on the writer's dedicated connection, serialised with
    /// every other write.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as AnyBox)),
                ret_tx,
            ))
            .await
            .map_err(|_| writer_gone())?;

        let boxed = ret_rx.await.map_err(|_| writer_gone())??;
        boxed.downcast::<T>().map(|v| *v).map_err(|_| {
            DatabaseError::Internal("Writer returned an unexpected result type".to_string()).into()
        })
    }
}

/// Spawns the single writer task. It holds one pooled connection for its
/// whole life and runs jobs one at a time, each in its own immediate
/// transaction.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(1024);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                log::error!("Writer could not get a database connection: {}", e);
                // dropping `rx` makes every pending and future exec fail
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<AnyBox> = conn
                .immediate_transaction::<_, StorageError, _>(|c| {
                    run_guarded(job, c).map_err(StorageError::from)
                })
                .map_err(Into::into);

            if let Err(e) = &result {
                log::debug!("Write transaction rolled back: {}", e);
            }
            // the requester may have gone away; nothing to do then
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
