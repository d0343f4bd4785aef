//! Price cache persisted as `prices.json`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use skyvestments_market_data::{InMemoryPriceCache, ItemKey, PriceCacheStore, PriceRecord};
use tokio::sync::{mpsc, oneshot};

use crate::document::JsonDocument;
use crate::errors::Result;

/// On-disk shape: `{ "prices": { "<key>": { ...record } } }`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricesFile {
    #[serde(default)]
    pub prices: HashMap<ItemKey, PriceRecord>,
}

/// Reads and writes the price document.
pub struct JsonPriceStore {
    document: JsonDocument<PricesFile>,
}

impl JsonPriceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }

    pub fn load(&self) -> Result<HashMap<ItemKey, PriceRecord>> {
        Ok(self.document.load()?.prices)
    }

    /// Save whatever `cache` holds at the moment the document lock is taken.
    fn save_current(&self, cache: &InMemoryPriceCache) -> Result<()> {
        self.document.save_with(|| PricesFile {
            prices: cache.snapshot(),
        })
    }
}

enum WriteCommand {
    Save,
    Flush(oneshot::Sender<()>),
}

/// Single writer for the price document. Queued saves are coalesced and
/// each save reads the cache when it runs, so the last save always holds
/// every earlier write.
fn run_writer(
    cache: Arc<InMemoryPriceCache>,
    store: Arc<JsonPriceStore>,
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
) {
    while let Some(command) = rx.blocking_recv() {
        let mut dirty = false;
        let mut waiters = Vec::new();
        let mut next = Some(command);
        while let Some(command) = next {
            match command {
                WriteCommand::Save => dirty = true,
                WriteCommand::Flush(reply) => waiters.push(reply),
            }
            next = rx.try_recv().ok();
        }

        if dirty {
            if let Err(e) = store.save_current(&cache) {
                warn!("Failed to save price cache: {}", e);
            }
        }
        for reply in waiters {
            let _ = reply.send(());
        }
    }
    debug!("Price cache writer stopped");
}

/// Write-through [`PriceCacheStore`]: reads are served from memory, every
/// write queues a rewrite of the document on a dedicated writer thread.
///
/// A failed save is logged and the in-memory write kept; resolution never
/// fails because the disk did.
pub struct PersistentPriceCache {
    memory: Arc<InMemoryPriceCache>,
    store: Arc<JsonPriceStore>,
    writer: Option<mpsc::UnboundedSender<WriteCommand>>,
}

impl PersistentPriceCache {
    /// Open the document at `path` and load whatever it holds.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = Arc::new(JsonPriceStore::new(path));
        let records = match store.load() {
            Ok(records) => records,
            Err(e) => {
                warn!("Starting with an empty price cache: {}", e);
                HashMap::new()
            }
        };
        debug!("Loaded {} cached prices", records.len());
        let memory = Arc::new(InMemoryPriceCache::with_records(records));

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = {
            let memory = memory.clone();
            let store = store.clone();
            thread::Builder::new()
                .name("price-cache-writer".to_string())
                .spawn(move || run_writer(memory, store, rx))
        };
        let writer = match writer {
            Ok(_) => Some(tx),
            Err(e) => {
                warn!("Price cache writer unavailable, saving inline: {}", e);
                None
            }
        };

        Self {
            memory,
            store,
            writer,
        }
    }

    pub fn shared(path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self::open(path))
    }

    fn schedule_save(&self) {
        let queued = self
            .writer
            .as_ref()
            .is_some_and(|tx| tx.send(WriteCommand::Save).is_ok());
        if !queued {
            if let Err(e) = self.store.save_current(&self.memory) {
                warn!("Failed to save price cache: {}", e);
            }
        }
    }

    fn request_flush(&self) -> Option<oneshot::Receiver<()>> {
        let (reply, done) = oneshot::channel();
        let tx = self.writer.as_ref()?;
        tx.send(WriteCommand::Flush(reply)).ok()?;
        Some(done)
    }

    /// Wait until every write made so far is on disk.
    pub async fn flush(&self) {
        if let Some(done) = self.request_flush() {
            let _ = done.await;
        }
    }

    /// Blocking [`flush`](Self::flush) for callers outside an async runtime.
    pub fn flush_blocking(&self) {
        if let Some(done) = self.request_flush() {
            let _ = done.blocking_recv();
        }
    }
}

impl PriceCacheStore for PersistentPriceCache {
    fn get(&self, key: &ItemKey) -> Option<Arc<PriceRecord>> {
        self.memory.get(key)
    }

    fn put(&self, key: ItemKey, record: PriceRecord) {
        self.memory.put(key, record);
        self.schedule_save();
    }

    fn snapshot(&self) -> HashMap<ItemKey, PriceRecord> {
        self.memory.snapshot()
    }

    fn replace_all(&self, records: HashMap<ItemKey, PriceRecord>) {
        self.memory.replace_all(records);
        self.schedule_save();
    }

    fn len(&self) -> usize {
        self.memory.len()
    }
}
