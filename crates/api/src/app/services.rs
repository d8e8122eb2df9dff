use std::sync::Arc;

use loyalty_infra::directory::Directory;
use loyalty_infra::document_store::InMemoryDocumentStore;
use loyalty_infra::executor::LedgerExecutor;
use loyalty_infra::query::LedgerQueries;

type Store = Arc<InMemoryDocumentStore>;

/// The wired service layer handed to every handler.
///
/// All three services share one store handle, so a write committed through
/// the executor is immediately visible to the directory and the queries.
pub struct AppServices {
    directory: Directory<Store>,
    executor: LedgerExecutor<Store>,
    queries: LedgerQueries<Store>,
}

pub fn build_services() -> AppServices {
    let store = Arc::new(InMemoryDocumentStore::new());
    AppServices {
        directory: Directory::new(Arc::clone(&store)),
        executor: LedgerExecutor::new(Arc::clone(&store)),
        queries: LedgerQueries::new(store),
    }
}

impl AppServices {
    pub fn directory(&self) -> &Directory<Store> {
        &self.directory
    }

    pub fn executor(&self) -> &LedgerExecutor<Store> {
        &self.executor
    }

    pub fn queries(&self) -> &LedgerQueries<Store> {
        &self.queries
    }
}
