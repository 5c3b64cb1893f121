//! The tabular writer: row protocol, batching, flush and close.

use std::io::Write;
use std::path::Path;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

use log::{debug, info, warn};

use super::cursor::RowCursor;
use crate::arrow::{Appended, ColumnSet};
use crate::config::OutputOptions;
use crate::error::{OutputError, Result};
use crate::output::{BatchSink, ParquetBatchSink};
use crate::schema::Schema;
use crate::sink::TableOutput;
use crate::termination::{self, Registration, Registry, TerminationHandler};
use crate::value::Value;

/// Writes rows of typed values as record batches into a [`BatchSink`].
///
/// Usage: [`set_schema`](Self::set_schema), open an output with one of the
/// `write_to_*` methods, write rows through [`TableOutput`], then
/// [`close`](Self::close). Dropping an open writer closes it.
pub struct TableWriter {
    core: Arc<SharedCore>,
    registration: Option<Registration>,
}

/// Writer state behind a lock that remembers which thread holds it.
struct SharedCore {
    core: Mutex<WriterCore>,
    holder: Mutex<Option<ThreadId>>,
}

struct CoreGuard<'a> {
    core: MutexGuard<'a, WriterCore>,
    holder: &'a Mutex<Option<ThreadId>>,
}

impl SharedCore {
    fn lock(&self) -> Result<CoreGuard<'_>> {
        let core = self
            .core
            .lock()
            .map_err(|_| OutputError::invalid_state("writer lock poisoned"))?;
        Ok(self.guard(core))
    }

    fn guard<'a>(&'a self, core: MutexGuard<'a, WriterCore>) -> CoreGuard<'a> {
        *lock_holder(&self.holder) = Some(thread::current().id());
        CoreGuard {
            core,
            holder: &self.holder,
        }
    }

    fn held_by_current_thread(&self) -> bool {
        *lock_holder(&self.holder) == Some(thread::current().id())
    }
}

fn lock_holder(holder: &Mutex<Option<ThreadId>>) -> MutexGuard<'_, Option<ThreadId>> {
    holder.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Deref for CoreGuard<'_> {
    type Target = WriterCore;

    fn deref(&self) -> &WriterCore {
        &self.core
    }
}

impl DerefMut for CoreGuard<'_> {
    fn deref_mut(&mut self) -> &mut WriterCore {
        &mut self.core
    }
}

impl Drop for CoreGuard<'_> {
    // Runs before the core guard field unlocks.
    fn drop(&mut self) {
        *lock_holder(self.holder) = None;
    }
}

struct WriterCore {
    options: OutputOptions,
    columns: Option<ColumnSet>,
    cursor: RowCursor,
    sink: Option<Box<dyn BatchSink>>,
    /// Why the writer stopped accepting data, if it did.
    poisoned: Option<String>,
    closed: bool,
    encoding_failures: u64,
}

impl TableWriter {
    /// Create a writer registered with the process-wide termination registry.
    pub fn new(options: OutputOptions) -> Result<Self> {
        Self::with_registry(options, termination::global())
    }

    pub fn with_registry(options: OutputOptions, registry: &Arc<Registry>) -> Result<Self> {
        options.validate()?;
        let core = Arc::new(SharedCore {
            core: Mutex::new(WriterCore {
            options,
            columns: None,
            cursor: RowCursor::new(0),
            sink: None,
            poisoned: None,
            closed: false,
            encoding_failures: 0,
            }),
            holder: Mutex::new(None),
        });
        let handler: Weak<dyn TerminationHandler> = Arc::<SharedCore>::downgrade(&core);
        let registration = registry.register(handler);
        Ok(Self {
            core,
            registration: Some(registration),
        })
    }

    fn core(&self) -> Result<CoreGuard<'_>> {
        self.core.lock()
    }

    /// Assign the table schema, replacing any previous one.
    ///
    /// Rows buffered under the previous schema are discarded. Fails without
    /// changing anything if the schema cannot be mapped, or if an output is
    /// already open.
    pub fn set_schema(&mut self, schema: Schema) -> Result<()> {
        let mut core = self.core()?;
        core.check_open()?;
        if core.sink.is_some() {
            return Err(OutputError::invalid_state(
                "cannot change the schema while an output is open",
            ));
        }

        let columns = ColumnSet::new(&schema)?;
        if core.cursor.batch_rows() > 0 || core.cursor.in_row() {
            warn!(
                "discarding {} buffered rows on schema change",
                core.cursor.batch_rows()
            );
        }
        debug!("schema set with {} columns", columns.len());
        core.cursor = RowCursor::new(columns.len());
        core.columns = Some(columns);
        Ok(())
    }

    pub fn schema(&self) -> Option<Schema> {
        let core = self.core().ok()?;
        core.columns.as_ref().map(|c| c.schema().clone())
    }

    /// Write Parquet into any byte stream.
    pub fn write_to_stream<W: Write + Send + 'static>(&mut self, stream: W) -> Result<()> {
        let mut core = self.core()?;
        let arrow_schema = core.arrow_schema()?;
        let sink = ParquetBatchSink::new(stream, arrow_schema, &core.options.parquet)?;
        core.attach(Box::new(sink))
    }

    /// Create (or truncate) a Parquet file at `path`.
    pub fn write_to_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(OutputError::InvalidArgument("output path is empty".into()));
        }
        let mut core = self.core()?;
        let arrow_schema = core.arrow_schema()?;
        let sink = ParquetBatchSink::create(path, arrow_schema, &core.options.parquet)?;
        info!("writing {}", path.display());
        core.attach(Box::new(sink))
    }

    pub fn write_to_sink(&mut self, sink: Box<dyn BatchSink>) -> Result<()> {
        let mut core = self.core()?;
        core.arrow_schema()?;
        core.attach(sink)
    }

    /// Hand buffered rows to the sink. A no-op when nothing is buffered.
    pub fn flush(&mut self) -> Result<()> {
        self.core()?.flush()
    }

    /// Flush, finish the sink and stop accepting data. Closing twice is fine.
    pub fn close(&mut self) -> Result<()> {
        let result = self.core()?.close();
        self.registration.take();
        result
    }

    pub fn total_rows(&self) -> u64 {
        self.core().map(|c| c.cursor.total_rows()).unwrap_or(0)
    }

    pub fn batch_rows(&self) -> usize {
        self.core().map(|c| c.cursor.batch_rows()).unwrap_or(0)
    }

    /// Text values that could not be transcoded and were stored as nulls.
    pub fn encoding_failures(&self) -> u64 {
        self.core().map(|c| c.encoding_failures).unwrap_or(0)
    }

    pub fn is_closed(&self) -> bool {
        self.core().map(|c| c.closed).unwrap_or(true)
    }
}

impl TableOutput for TableWriter {
    fn write_value(&mut self, value: Value<'_>) -> Result<()> {
        self.core()?.write_value(&value)
    }

    fn write_nothing(&mut self) -> Result<()> {
        self.core()?.write_nothing()
    }

    fn abandon_row(&mut self) -> Result<()> {
        let mut core = self.core()?;
        core.writable()?;
        core.fill_row();
        Ok(())
    }

    fn end_of_row(&mut self) -> Result<()> {
        let mut core = self.core()?;
        core.writable()?;
        if let Err(violation) = core.cursor.end_of_row() {
            return Err(core.poison(violation.into()));
        }
        core.flush_if_full()
    }
}

impl Drop for TableWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("failed to close table writer: {}", e);
        }
    }
}

impl WriterCore {
    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(OutputError::invalid_state("writer is closed"));
        }
        Ok(())
    }

    /// Checks shared by every data write.
    fn writable(&mut self) -> Result<&mut ColumnSet> {
        self.check_open()?;
        if let Some(reason) = &self.poisoned {
            return Err(OutputError::InvalidState(format!(
                "writer unusable after earlier error: {}",
                reason
            )));
        }
        self.columns
            .as_mut()
            .ok_or_else(|| OutputError::invalid_state("no schema assigned"))
    }

    fn arrow_schema(&self) -> Result<arrow::datatypes::SchemaRef> {
        self.check_open()?;
        self.columns
            .as_ref()
            .map(|c| c.arrow_schema().clone())
            .ok_or_else(|| OutputError::invalid_state("no schema assigned"))
    }

    /// Record a fatal error and hand it back.
    fn poison(&mut self, error: OutputError) -> OutputError {
        if error.is_fatal() && self.poisoned.is_none() {
            warn!("table writer poisoned: {}", error);
            self.poisoned = Some(error.to_string());
        }
        error
    }

    fn write_value(&mut self, value: &Value<'_>) -> Result<()> {
        self.writable()?;
        let index = match self.cursor.next_column() {
            Ok(index) => index,
            Err(violation) => return Err(self.poison(violation.into())),
        };
        let Some(columns) = self.columns.as_mut() else {
            return Err(OutputError::invalid_state("no schema assigned"));
        };
        match columns.append(index, value) {
            Ok(Appended::Value) => {}
            Ok(Appended::EncodingFailed) => {
                self.encoding_failures += 1;
                warn!(
                    "column {} ('{}'): {} value could not be transcoded, stored as null",
                    index,
                    columns.schema().columns()[index].name,
                    value.type_name()
                );
            }
            Err(e) => return Err(self.poison(e)),
        }
        self.cursor.advance();
        Ok(())
    }

    fn write_nothing(&mut self) -> Result<()> {
        self.writable()?;
        let index = match self.cursor.next_column() {
            Ok(index) => index,
            Err(violation) => return Err(self.poison(violation.into())),
        };
        if let Some(columns) = self.columns.as_mut() {
            columns.append_null(index);
        }
        self.cursor.advance();
        Ok(())
    }

    /// Nulls from the current column to the end of the row.
    fn fill_row(&mut self) {
        let Some(columns) = self.columns.as_mut() else {
            return;
        };
        while let Ok(index) = self.cursor.next_column() {
            columns.append_null(index);
            self.cursor.advance();
        }
    }

    fn attach(&mut self, sink: Box<dyn BatchSink>) -> Result<()> {
        self.writable()?;
        if self.sink.is_some() {
            self.flush()?;
            self.finish_sink()?;
        }
        self.sink = Some(sink);
        self.flush_if_full()
    }

    /// Flush once a batch reaches the configured size. Rows written before
    /// any output is open stay buffered until one is.
    fn flush_if_full(&mut self) -> Result<()> {
        match self.options.batch_size {
            Some(batch_size) if self.sink.is_some() && self.cursor.batch_rows() >= batch_size => {
                self.flush()
            }
            _ => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.check_open()?;
        if let Some(reason) = &self.poisoned {
            return Err(OutputError::InvalidState(format!(
                "cannot flush after earlier error: {}",
                reason
            )));
        }
        if self.sink.is_none() {
            return Err(OutputError::invalid_state("no output open"));
        }
        if self.cursor.in_row() {
            return Err(OutputError::invalid_state("cannot flush in the middle of a row"));
        }
        let rows = self.cursor.batch_rows();
        if rows == 0 {
            return Ok(());
        }

        let batch = match self.columns.as_mut() {
            Some(columns) => columns.finish(rows),
            None => return Err(OutputError::invalid_state("no schema assigned")),
        };
        self.cursor.reset_batch();
        let batch = batch.map_err(|e| self.poison(e))?;

        debug!("flushing batch of {} rows", rows);
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.write_batch(batch) {
                return Err(self.poison(e.into()));
            }
        }
        Ok(())
    }

    fn finish_sink(&mut self) -> Result<()> {
        match self.sink.take() {
            Some(sink) => sink.finish().map_err(|e| self.poison(e.into())),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        let mut result = Ok(());
        if self.poisoned.is_some() {
            if self.cursor.batch_rows() > 0 || self.cursor.in_row() {
                warn!("dropping {} unflushed rows of a failed writer", self.cursor.batch_rows());
            }
        } else if self.sink.is_some() {
            if self.cursor.in_row() {
                warn!("closing in the middle of a row, filling it with nulls");
                self.fill_row();
                if let Err(violation) = self.cursor.end_of_row() {
                    result = Err(violation.into());
                }
            }
            if result.is_ok() {
                result = self.flush();
            }
        } else if self.cursor.batch_rows() > 0 {
            warn!(
                "closing with {} buffered rows and no output open",
                self.cursor.batch_rows()
            );
        }

        let finished = self.finish_sink();
        self.closed = true;
        info!("table writer closed after {} rows", self.cursor.total_rows());
        result.and(finished)
    }
}

impl TerminationHandler for SharedCore {
    fn describe(&self) -> String {
        "table writer".to_string()
    }

    /// Close the writer so its output is complete on disk. Waits for a row
    /// write in progress on another thread; a writer locked by the
    /// terminating thread itself is skipped.
    fn terminate(&self) -> Result<()> {
        if self.held_by_current_thread() {
            return Err(OutputError::invalid_state(
                "writer is locked by the terminating thread",
            ));
        }
        let core = self.core.lock().unwrap_or_else(PoisonError::into_inner);
        let mut core = self.guard(core);
        if core.closed {
            return Ok(());
        }
        warn!(
            "terminating: closing table writer with {} buffered rows",
            core.cursor.batch_rows()
        );
        core.close()
    }
}
