//! Single-writer storage actor.
//!
//! # Responsibility
//! - Own the only SQLite connection on a dedicated worker thread.
//! - Execute queued statements one at a time and stream result rows back over
//!   a per-call response channel.
//!
//! # Invariants
//! - The worker is the sole consumer of the request queue; requests run in
//!   strict submission order.
//! - Every statement submitted with a reply channel is answered with either a
//!   `Response::Fault` or zero or more rows followed by `Response::Done`.
//! - A failing statement never stops the worker.
//! - Requests submitted after `close` are rejected with `ConnectionClosed`.

use super::{DbError, DbResult};
use log::{debug, error, info, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

const WORKER_THREAD_NAME: &str = "lexiconner-storage";

/// One result row, columns in statement order.
pub type Row = Vec<Value>;

/// Message consumed by the storage worker.
pub enum Request {
    /// Parameterized statement. Without `reply` it runs for side effect only.
    Statement {
        sql: String,
        params: Vec<Value>,
        reply: Option<Sender<Response>>,
    },
    /// Termination sentinel: commit, close the connection, exit.
    Shutdown,
}

/// Message streamed back to a caller on its reply channel.
#[derive(Debug)]
pub enum Response {
    Row(Row),
    Fault(rusqlite::Error),
    /// End-of-stream sentinel.
    Done,
}

/// Handle to the storage worker. Shareable across threads.
pub struct StorageActor {
    requests: Sender<Request>,
    closed: AtomicBool,
    faults: Arc<AtomicU64>,
    worker: Mutex<Option<JoinHandle<DbResult<()>>>>,
}

impl StorageActor {
    /// Moves `conn` onto a new worker thread and opens the lifetime transaction.
    ///
    /// # Errors
    /// - `DbError::Sqlite` when the transaction cannot be started.
    /// - `DbError::WorkerSpawn` when the OS refuses to create the thread.
    pub fn spawn(conn: Connection) -> DbResult<Self> {
        conn.execute_batch("BEGIN DEFERRED;")?;

        let (requests, inbox) = mpsc::channel();
        let faults = Arc::new(AtomicU64::new(0));
        let worker_faults = Arc::clone(&faults);
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(conn, inbox, &worker_faults))
            .map_err(DbError::WorkerSpawn)?;

        info!("event=storage_spawn module=db status=ok thread={WORKER_THREAD_NAME}");
        Ok(Self {
            requests,
            closed: AtomicBool::new(false),
            faults,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Enqueues one statement and returns without waiting for it to run.
    ///
    /// When `reply` is set, the worker sends every result row followed by
    /// `Response::Done`, or a single `Response::Fault`.
    pub fn execute(
        &self,
        sql: impl Into<String>,
        params: Vec<Value>,
        reply: Option<Sender<Response>>,
    ) -> DbResult<()> {
        if self.is_closed() {
            return Err(DbError::ConnectionClosed);
        }

        self.requests
            .send(Request::Statement {
                sql: sql.into(),
                params,
                reply,
            })
            .map_err(|_| DbError::ConnectionClosed)
    }

    /// Enqueues a query and returns a lazy iterator over its rows.
    ///
    /// Iteration blocks until the worker reaches this request. The iterator is
    /// finite and cannot be restarted; dropping it early is fine.
    pub fn select(&self, sql: impl Into<String>, params: Vec<Value>) -> DbResult<Rows> {
        let (reply, responses) = mpsc::channel();
        self.execute(sql, params, Some(reply))?;
        Ok(Rows {
            responses,
            finished: false,
        })
    }

    /// Enqueues a statement and blocks until the worker has run it.
    ///
    /// Any rows produced are discarded. Used for writes whose failure the
    /// caller has to observe.
    pub fn execute_and_wait(&self, sql: impl Into<String>, params: Vec<Value>) -> DbResult<()> {
        for row in self.select(sql, params)? {
            row?;
        }
        Ok(())
    }

    /// Enqueues the termination sentinel.
    ///
    /// Returns as soon as the sentinel is queued; commit and close happen on
    /// the worker. Requests already queued ahead of it still run.
    pub fn close(&self) -> DbResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(DbError::ConnectionClosed);
        }

        info!("event=storage_close module=db status=start");
        self.requests
            .send(Request::Shutdown)
            .map_err(|_| DbError::ConnectionClosed)
    }

    /// Waits for the worker to exit and returns the outcome of its final
    /// commit. Closes the actor first when still open.
    ///
    /// Concurrent callers block until the worker has exited; only the first
    /// one observes the commit outcome, later calls return `Ok(())`.
    pub fn join(&self) -> DbResult<()> {
        if !self.is_closed() {
            // A concurrent close may win the race; either way the sentinel is queued.
            let _ = self.close();
        }

        // The lock is held across the join so no caller returns before the commit.
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        match worker.take() {
            Some(handle) => handle.join().map_err(|_| DbError::WorkerPanicked)?,
            None => Ok(()),
        }
    }

    /// Returns whether `close` has been called on this handle.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of fire-and-forget statements that failed on the worker.
    pub fn unobserved_faults(&self) -> u64 {
        self.faults.load(Ordering::SeqCst)
    }
}

impl Drop for StorageActor {
    fn drop(&mut self) {
        if let Err(err) = self.join() {
            error!("event=storage_close module=db status=error phase=drop error={err}");
        }
    }
}

/// Lazy row sequence backed by a reply channel.
pub struct Rows {
    responses: Receiver<Response>,
    finished: bool,
}

impl Iterator for Rows {
    type Item = DbResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.responses.recv() {
            Ok(Response::Row(row)) => Some(Ok(row)),
            Ok(Response::Done) => {
                self.finished = true;
                None
            }
            Ok(Response::Fault(err)) => {
                self.finished = true;
                Some(Err(DbError::ExecutionFault(err)))
            }
            // Reply sender dropped without a sentinel: the worker exited
            // before reaching this request.
            Err(_) => {
                self.finished = true;
                Some(Err(DbError::ConnectionClosed))
            }
        }
    }
}

fn run_worker(conn: Connection, inbox: Receiver<Request>, faults: &AtomicU64) -> DbResult<()> {
    debug!("event=storage_worker module=db status=start");
    let mut served: u64 = 0;

    while let Ok(request) = inbox.recv() {
        match request {
            Request::Shutdown => break,
            Request::Statement { sql, params, reply } => {
                served += 1;
                run_statement(&conn, &sql, params, reply.as_ref(), faults);
            }
        }
    }

    // Anything still queued behind the sentinel is dropped here, which
    // disconnects the waiting callers.
    drop(inbox);

    match finish(conn) {
        Ok(()) => {
            info!("event=storage_close module=db status=ok served={served}");
            Ok(())
        }
        Err(err) => {
            error!("event=storage_close module=db status=error served={served} error={err}");
            Err(err)
        }
    }
}

fn run_statement(
    conn: &Connection,
    sql: &str,
    params: Vec<Value>,
    reply: Option<&Sender<Response>>,
    faults: &AtomicU64,
) {
    match stream_rows(conn, sql, params, reply) {
        Ok(()) => {
            if let Some(reply) = reply {
                let _ = reply.send(Response::Done);
            }
        }
        Err(err) => match reply {
            Some(reply) => {
                warn!(
                    "event=storage_execute module=db status=error statement={} reported=reply error={}",
                    statement_verb(sql),
                    err
                );
                let _ = reply.send(Response::Fault(err));
            }
            None => {
                faults.fetch_add(1, Ordering::SeqCst);
                error!(
                    "event=storage_execute module=db status=error statement={} reported=log error={}",
                    statement_verb(sql),
                    err
                );
            }
        },
    }
}

fn stream_rows(
    conn: &Connection,
    sql: &str,
    params: Vec<Value>,
    reply: Option<&Sender<Response>>,
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(sql)?;
    let column_count = stmt.column_count();
    let mut rows = stmt.query(params_from_iter(params))?;

    while let Some(row) = rows.next()? {
        let Some(reply) = reply else {
            continue;
        };

        let mut values = Vec::with_capacity(column_count);
        for index in 0..column_count {
            values.push(row.get::<_, Value>(index)?);
        }
        if reply.send(Response::Row(values)).is_err() {
            // Caller dropped its `Rows`.
            return Ok(());
        }
    }

    Ok(())
}

fn finish(conn: Connection) -> DbResult<()> {
    if !conn.is_autocommit() {
        conn.execute_batch("COMMIT;")?;
    }
    conn.close().map_err(|(_, err)| DbError::Sqlite(err))
}

fn statement_verb(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .unwrap_or("<empty>")
        .to_ascii_uppercase()
}
