//! Bag-of-fragments database lifecycle: create, populate, open.
//!
//! On disk a database is a directory:
//!
//! ```text
//! <name>/
//!   frag.lib   -- byte-identical copy of the source library file
//!   bow.db     -- concatenation of length-prefixed entry records
//! ```
//!
//! A [`DbWriter`] computes entries on a pool of worker threads, each with
//! its own RMSD scratch memory, and a single writer thread appends records
//! as they arrive. Entries therefore land on disk in arrival order, which
//! is not the order sources were added; entry order is not semantic.
//!
//! A [`Database`] opens the directory read-only and eagerly materializes
//! every entry in memory.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use physalia_core::{ContentAddressable, PhysaliaError, Result, Summarizable};
use physalia_frag::bow::Bow;
use physalia_frag::library::FragmentLibrary;
use physalia_frag::source::{BowBuilder, BowSource};

use crate::codec::{EntryDecoder, EntryEncoder};

/// File name of the embedded fragment library copy.
pub const LIBRARY_FILE: &str = "frag.lib";

/// File name of the entry records.
pub const ENTRIES_FILE: &str = "bow.db";

/// Queue slots per worker on the source and entry channels; senders block
/// once the queues fill.
const QUEUE_DEPTH_PER_WORKER: usize = 4;

/// A single row of a database: a globally-unique id (typically PDB code
/// plus chain letter) and its bag-of-fragments vector.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry {
    pub id: String,
    pub bow: Bow,
}

/// Settings for database creation. No process-wide state: every writer gets
/// its options passed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Size of the BOF worker pool. Defaults to the available parallelism.
    pub workers: Option<usize>,
}

type BoxedSource = Box<dyn BowSource + Send>;

#[derive(Debug)]
struct Pipeline {
    sources: SyncSender<BoxedSource>,
    workers: Vec<JoinHandle<()>>,
    writer: JoinHandle<Result<()>>,
}

/// A database being built. Closing it exactly once finalizes the on-disk
/// files; the database can then be reopened with [`Database::open`].
#[derive(Debug)]
pub struct DbWriter {
    name: String,
    path: PathBuf,
    library: Arc<FragmentLibrary>,
    pipeline: Option<Pipeline>,
}

impl DbWriter {
    /// Create a new database directory and start the build pipeline.
    ///
    /// # Errors
    ///
    /// `DatabaseExists` if anything already exists at `dir`.
    pub fn create(
        library: FragmentLibrary,
        dir: impl AsRef<Path>,
        opts: WriteOptions,
    ) -> Result<DbWriter> {
        let dir = dir.as_ref();
        if dir.exists() {
            return Err(PhysaliaError::DatabaseExists(dir.display().to_string()));
        }
        fs::create_dir_all(dir).map_err(|e| io_context(dir, e))?;

        library.copy_to(dir.join(LIBRARY_FILE))?;
        let entries_path = dir.join(ENTRIES_FILE);
        let file = File::create(&entries_path).map_err(|e| io_context(&entries_path, e))?;

        let library = Arc::new(library);
        let worker_count = opts
            .workers
            .unwrap_or_else(|| {
                thread::available_parallelism()
                    .map(|p| p.get())
                    .unwrap_or(1)
            })
            .max(1);

        let queue_depth = worker_count * QUEUE_DEPTH_PER_WORKER;
        let (source_tx, source_rx) = mpsc::sync_channel::<BoxedSource>(queue_depth);
        let source_rx = Arc::new(Mutex::new(source_rx));
        let (entry_tx, entry_rx) = mpsc::sync_channel::<Entry>(queue_depth);

        let mut workers = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let source_rx = Arc::clone(&source_rx);
            let entry_tx = entry_tx.clone();
            let library = Arc::clone(&library);
            workers.push(thread::spawn(move || {
                let mut builder = BowBuilder::new(&library);
                loop {
                    // The receiver lock is held only for the dequeue, never
                    // while a BOF is computed.
                    let source = {
                        let rx = source_rx.lock().expect("source queue lock poisoned");
                        rx.recv()
                    };
                    let source = match source {
                        Ok(s) => s,
                        Err(_) => break,
                    };
                    let entry = Entry {
                        id: source.id(),
                        bow: builder.build(source.as_ref()),
                    };
                    if entry_tx.send(entry).is_err() {
                        break;
                    }
                }
            }));
        }
        // The writer ends once every worker has dropped its sender.
        drop(entry_tx);

        let library_size = library.size();
        let writer = thread::spawn(move || -> Result<()> {
            let mut out = BufWriter::new(file);
            let mut encoder = EntryEncoder::new();
            for entry in entry_rx {
                match encoder.encode(&entry, library_size) {
                    Ok(record) => {
                        if let Err(e) = out.write_all(record) {
                            warn!(entry = %entry.id, path = %entries_path.display(),
                                "could not write entry: {}", e);
                        }
                    }
                    Err(e) => {
                        warn!(entry = %entry.id, "could not encode entry: {}", e);
                    }
                }
            }
            out.flush()?;
            Ok(())
        });

        debug!(path = %dir.display(), workers = worker_count,
            library = %library.content_hash(), "created BOF database");

        Ok(DbWriter {
            name: dir_name(dir),
            path: dir.to_path_buf(),
            library,
            pipeline: Some(Pipeline {
                sources: source_tx,
                workers,
                writer,
            }),
        })
    }

    /// Queue a source for indexing. Safe to call from multiple threads
    /// through a shared reference; blocks when the source queue is full.
    ///
    /// # Errors
    ///
    /// `DatabaseClosed` after [`close`](DbWriter::close) has been called.
    pub fn add(&self, source: impl BowSource + Send + 'static) -> Result<()> {
        let pipeline = self
            .pipeline
            .as_ref()
            .ok_or(PhysaliaError::DatabaseClosed)?;
        pipeline
            .sources
            .send(Box::new(source))
            .map_err(|_| PhysaliaError::Other("database build pipeline has shut down".into()))
    }

    /// Signal end of input, drain the workers, and flush the entries file.
    /// Must be called exactly once.
    pub fn close(&mut self) -> Result<()> {
        let pipeline = self.pipeline.take().ok_or(PhysaliaError::DatabaseClosed)?;
        drop(pipeline.sources);
        for worker in pipeline.workers {
            if worker.join().is_err() {
                return Err(PhysaliaError::Other(
                    "database build worker panicked".into(),
                ));
            }
        }
        match pipeline.writer.join() {
            Ok(result) => result?,
            Err(_) => {
                return Err(PhysaliaError::Other(
                    "database writer thread panicked".into(),
                ))
            }
        }
        debug!(path = %self.path.display(), "closed BOF database");
        Ok(())
    }

    /// The database name (base name of its directory).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The database directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The library entries are computed against.
    pub fn library(&self) -> &FragmentLibrary {
        &self.library
    }
}

impl Drop for DbWriter {
    fn drop(&mut self) {
        if self.pipeline.is_some() {
            if let Err(e) = self.close() {
                warn!(path = %self.path.display(), "implicit close failed: {}", e);
            }
        }
    }
}

/// A database opened for reading. All entries are materialized in memory;
/// the file handle is released once loading finishes.
#[derive(Debug)]
pub struct Database {
    pub name: String,
    pub path: PathBuf,
    pub library: FragmentLibrary,
    pub entries: Vec<Entry>,
}

impl Database {
    /// Open a database directory and load every entry.
    ///
    /// # Errors
    ///
    /// `DatabaseMissing` when the directory or its files are absent;
    /// `Corrupt` when the entries file ends inside a record. A partially
    /// loaded database is never returned.
    pub fn open(dir: impl AsRef<Path>) -> Result<Database> {
        let dir = dir.as_ref();
        let library_path = dir.join(LIBRARY_FILE);
        let entries_path = dir.join(ENTRIES_FILE);
        if !dir.is_dir() || !library_path.is_file() || !entries_path.is_file() {
            return Err(PhysaliaError::DatabaseMissing(dir.display().to_string()));
        }

        let library = FragmentLibrary::from_file(&library_path)?;

        let file = File::open(&entries_path).map_err(|e| io_context(&entries_path, e))?;
        let mut reader = BufReader::new(file);
        let mut decoder = EntryDecoder::new(library.size());
        let mut entries = Vec::with_capacity(1000);
        while let Some(entry) = decoder.read_from(&mut reader)? {
            entries.push(entry);
        }

        debug!(path = %dir.display(), entries = entries.len(),
            library = %library.content_hash(), "opened BOF database");

        Ok(Database {
            name: dir_name(dir),
            path: dir.to_path_buf(),
            library,
            entries,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Summarizable for Database {
    fn summary(&self) -> String {
        format!(
            "Database {} — {} entries over library {}",
            self.name,
            self.entries.len(),
            self.library
        )
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

fn io_context(path: &Path, e: std::io::Error) -> PhysaliaError {
    PhysaliaError::Io(std::io::Error::new(
        e.kind(),
        format!("{}: {}", path.display(), e),
    ))
}
