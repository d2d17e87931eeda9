//! End-to-end scenarios spanning indexer, store, vector index, and
//! search service together (spec §8 Scenarios). Module-local unit
//! tests already cover the invariants in isolation; these exercise
//! the pipeline the way `main.rs` wires it.

use code_search_mcp::domain::types::ProjectStatus;
use code_search_mcp::embedding::service::EmbeddingService;
use code_search_mcp::embedding::word_average::WordAverageProvider;
use code_search_mcp::index::VectorIndex;
use code_search_mcp::indexer::{IndexerConfig, ProjectIndexer};
use code_search_mcp::search::SearchService;
use code_search_mcp::store::{ChunkStore, ProjectRegistry};
use std::sync::Arc;
use tempfile::tempdir;

fn build_pipeline(index_dir: &std::path::Path) -> (Arc<ProjectIndexer>, Arc<SearchService>, Arc<ProjectRegistry>, Arc<ChunkStore>) {
    let chunk_store = Arc::new(ChunkStore::open(index_dir).unwrap());
    let registry = Arc::new(ProjectRegistry::load(index_dir).unwrap());
    let vector_index = Arc::new(VectorIndex::new());
    let embeddings = Arc::new(
        EmbeddingService::new(Arc::new(WordAverageProvider::new()), index_dir.join("embedding-cache")).unwrap(),
    );
    let indexer = Arc::new(ProjectIndexer::new(
        IndexerConfig::default(),
        chunk_store.clone(),
        registry.clone(),
        vector_index.clone(),
        embeddings.clone(),
    ));
    let search = Arc::new(SearchService::new(embeddings, vector_index, chunk_store.clone()));
    (indexer, search, registry, chunk_store)
}

#[tokio::test]
async fn s1_zero_result_on_empty_project() {
    let index_dir = tempdir().unwrap();
    let project_root = tempdir().unwrap();
    let (indexer, search, _registry, _store) = build_pipeline(index_dir.path());

    let counts = indexer.index_project("empty-project", project_root.path()).await.unwrap();
    assert_eq!(counts.files, 0);
    assert_eq!(counts.chunks, 0);

    let results = search.search("anything", 5, None).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn s2_basic_retrieval_ranks_matching_file_higher() {
    let index_dir = tempdir().unwrap();
    let project_root = tempdir().unwrap();

    std::fs::write(
        project_root.path().join("User.swift"),
        "class User {\n    func sendEmail(to account: String) {\n        // send an email to the user's account\n    }\n}\n",
    )
    .unwrap();
    std::fs::write(
        project_root.path().join("Article.swift"),
        "class Article {\n    func publish() {\n        // publish this article to readers\n    }\n}\n",
    )
    .unwrap();

    let (indexer, search, registry, _store) = build_pipeline(index_dir.path());
    indexer.index_project("blog", project_root.path()).await.unwrap();
    assert_eq!(registry.get("blog").unwrap().status, ProjectStatus::Complete);

    let results = search.search("user account and email", 5, None).await.unwrap();
    assert!(!results.is_empty());

    let user_result = results.iter().find(|r| r.file_path.ends_with("User.swift"));
    assert!(user_result.is_some(), "expected a result from User.swift");
    let user_relevance = user_result.unwrap().relevance;

    for result in &results {
        if result.file_path.ends_with("Article.swift") {
            assert!(
                user_relevance > result.relevance,
                "User.swift result ({user_relevance}) should outrank Article.swift ({})",
                result.relevance
            );
        }
    }
}

#[tokio::test]
async fn s5_clear_index_requires_confirmation() {
    let index_dir = tempdir().unwrap();
    let project_root = tempdir().unwrap();
    std::fs::write(project_root.path().join("main.rs"), "fn main() {}\n").unwrap();

    let (indexer, _search, registry, store) = build_pipeline(index_dir.path());
    indexer.index_project("tiny", project_root.path()).await.unwrap();
    assert!(!registry.list().is_empty());

    indexer.clear_all().unwrap();

    assert!(registry.list().is_empty());
    assert!(store.load_all().unwrap().is_empty());
}
