//! Tests for account name resolution

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Directory that counts calls and fails for ids starting with "bad"
struct CountingDirectory {
    calls: AtomicUsize,
}

impl CountingDirectory {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryLookup for CountingDirectory {
    async fn tenancy_name(&self, id: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if id.starts_with("bad") {
            Err(Error::Other(format!("directory service error for {id}")))
        } else {
            Ok(format!("name-of-{id}"))
        }
    }
}

#[tokio::test]
async fn test_static_directory_lookup() {
    let directory = StaticDirectory::new().with_name("ocid1.tenancy.oc1..a", "acme");

    assert_eq!(
        directory.tenancy_name("ocid1.tenancy.oc1..a").await.unwrap(),
        "acme"
    );
    let err = directory.tenancy_name("unknown").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn test_resolver_calls_directory_once_per_id() {
    let directory = CountingDirectory::new();
    let mut resolver = AccountNameResolver::new(&directory);

    assert_eq!(resolver.resolve("t1").await, "name-of-t1");
    assert_eq!(resolver.resolve("t1").await, "name-of-t1");
    assert_eq!(directory.calls(), 1);

    assert_eq!(resolver.resolve("t2").await, "name-of-t2");
    assert_eq!(directory.calls(), 2);
    assert_eq!(resolver.lookups(), 2);
    assert_eq!(resolver.cached(), 2);
}

#[tokio::test]
async fn test_resolver_caches_failures_as_empty() {
    let directory = CountingDirectory::new();
    let mut resolver = AccountNameResolver::new(&directory);

    assert_eq!(resolver.resolve("bad-tenant").await, "");
    assert_eq!(resolver.resolve("bad-tenant").await, "");
    assert_eq!(directory.calls(), 1);
}

#[tokio::test]
async fn test_resolver_with_empty_static_directory() {
    let directory = StaticDirectory::new();
    let mut resolver = AccountNameResolver::new(&directory);

    assert_eq!(resolver.resolve("anything").await, "");
    assert_eq!(resolver.cached(), 1);
}
