//! Request-scoped query cache and its dehydrated snapshot.
//!
//! A [`QueryCache`] is created for one render, filled by prefetches, then
//! dehydrated into a [`DehydratedState`] that the client runtime hydrates from.
//! The snapshot layout follows the client query library's dehydration format so
//! the client finds each entry under the same key hash and skips the refetch.

use std::future::Future;

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

/// Ordered, JSON-encoded query key such as `["notes", 1, "", "Work"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<Value>);

impl QueryKey {
    /// Key of the notes listing. `tag` is the raw route tag, not the upstream filter.
    pub fn notes(page: u32, search: &str, tag: &str) -> Self {
        Self(vec![
            Value::from("notes"),
            Value::from(page),
            Value::from(search),
            Value::from(tag),
        ])
    }

    /// Stable hash the client uses to look entries up: the compact JSON encoding.
    pub fn hash(&self) -> String {
        Value::Array(self.0.clone()).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DehydratedState {
    pub mutations: Vec<Value>,
    pub queries: Vec<DehydratedQuery>,
}

impl DehydratedState {
    pub fn find(&self, key: &QueryKey) -> Option<&DehydratedQuery> {
        let hash = key.hash();
        self.queries.iter().find(|query| query.query_hash == hash)
    }

    /// JSON safe to embed inside a `<script>` element.
    pub fn to_script_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self).map(|json| escape_for_script(&json))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DehydratedQuery {
    pub query_key: QueryKey,
    pub query_hash: String,
    pub state: QueryState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    pub data: Value,
    pub data_update_count: u32,
    pub data_updated_at: i64,
    pub error: Option<Value>,
    pub error_update_count: u32,
    pub error_updated_at: i64,
    pub fetch_failure_count: u32,
    pub fetch_failure_reason: Option<Value>,
    pub fetch_meta: Option<Value>,
    pub is_invalidated: bool,
    pub status: &'static str,
    pub fetch_status: &'static str,
}

impl QueryState {
    fn success(data: Value, updated_at: i64) -> Self {
        Self {
            data,
            data_update_count: 1,
            data_updated_at: updated_at,
            error: None,
            error_update_count: 0,
            error_updated_at: 0,
            fetch_failure_count: 0,
            fetch_failure_reason: None,
            fetch_meta: None,
            is_invalidated: false,
            status: "success",
            fetch_status: "idle",
        }
    }
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Vec<DehydratedQuery>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fetch` and store its result under `key`, returning the fetched value.
    ///
    /// Errors from `fetch` leave the cache untouched and are returned as-is.
    pub async fn prefetch<T, E, F, Fut>(&mut self, key: QueryKey, fetch: F) -> Result<T, E>
    where
        T: Serialize,
        E: From<serde_json::Error>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let data = fetch().await?;
        let encoded = serde_json::to_value(&data)?;
        self.insert(key, encoded);
        Ok(data)
    }

    pub fn dehydrate(&self) -> DehydratedState {
        DehydratedState {
            mutations: Vec::new(),
            queries: self.entries.clone(),
        }
    }

    fn insert(&mut self, key: QueryKey, data: Value) {
        let query_hash = key.hash();
        let state = QueryState::success(data, now_millis());
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.query_hash == query_hash)
        {
            Some(entry) => {
                entry.state.data_update_count = entry.state.data_update_count.saturating_add(1);
                entry.state.data = state.data;
                entry.state.data_updated_at = state.data_updated_at;
            }
            None => self.entries.push(DehydratedQuery {
                query_key: key,
                query_hash,
                state,
            }),
        }
    }
}

fn now_millis() -> i64 {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(millis).unwrap_or(i64::MAX)
}

fn escape_for_script(json: &str) -> String {
    let mut escaped = String::with_capacity(json.len());
    for ch in json.chars() {
        match ch {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestError;

    impl From<serde_json::Error> for TestError {
        fn from(_: serde_json::Error) -> Self {
            TestError
        }
    }

    #[test]
    fn notes_key_hash_is_compact_json() {
        let key = QueryKey::notes(1, "", "Work");
        assert_eq!(key.hash(), r#"["notes",1,"","Work"]"#);
        assert_eq!(
            serde_json::to_string(&key).expect("encode"),
            r#"["notes",1,"","Work"]"#
        );
    }

    #[tokio::test]
    async fn prefetch_stores_data_under_key() {
        let mut cache = QueryCache::new();
        let key = QueryKey::notes(1, "", "");
        let value = cache
            .prefetch(key.clone(), || async { Ok::<_, TestError>(vec![1, 2, 3]) })
            .await
            .expect("prefetch");

        assert_eq!(value, vec![1, 2, 3]);
        let state = cache.dehydrate();
        assert_eq!(state.queries.len(), 1);
        assert_eq!(
            state.find(&key).map(|query| &query.state.data),
            Some(&serde_json::json!([1, 2, 3]))
        );
    }

    #[tokio::test]
    async fn failed_prefetch_leaves_cache_empty() {
        let mut cache = QueryCache::new();
        let result = cache
            .prefetch(QueryKey::notes(1, "", ""), || async {
                Err::<u32, _>(TestError)
            })
            .await;

        assert!(result.is_err());
        assert!(cache.dehydrate().queries.is_empty());
    }

    #[tokio::test]
    async fn repeated_prefetch_replaces_data() {
        let mut cache = QueryCache::new();
        let key = QueryKey::notes(1, "", "Work");
        cache
            .prefetch(key.clone(), || async { Ok::<_, TestError>("old") })
            .await
            .expect("first");
        cache
            .prefetch(key.clone(), || async { Ok::<_, TestError>("new") })
            .await
            .expect("second");

        let state = cache.dehydrate();
        assert_eq!(state.queries.len(), 1);
        let query = state.find(&key).expect("query");
        assert_eq!(query.state.data, serde_json::json!("new"));
        assert_eq!(query.state.data_update_count, 2);
    }

    #[tokio::test]
    async fn dehydrated_state_matches_client_layout() {
        let mut cache = QueryCache::new();
        cache
            .prefetch(QueryKey::notes(1, "", "All"), || async {
                Ok::<_, TestError>(serde_json::json!({"notes": [], "totalPages": 0}))
            })
            .await
            .expect("prefetch");

        let encoded = serde_json::to_value(cache.dehydrate()).expect("encode");
        let query = &encoded["queries"][0];
        assert_eq!(encoded["mutations"], serde_json::json!([]));
        assert_eq!(query["queryKey"], serde_json::json!(["notes", 1, "", "All"]));
        assert_eq!(query["queryHash"], r#"["notes",1,"","All"]"#);
        assert_eq!(query["state"]["status"], "success");
        assert_eq!(query["state"]["fetchStatus"], "idle");
        assert_eq!(query["state"]["data"]["totalPages"], 0);
        assert!(query["state"]["dataUpdatedAt"].as_i64().expect("timestamp") > 0);
    }

    #[test]
    fn script_json_cannot_close_the_script_element() {
        let state = DehydratedState {
            mutations: Vec::new(),
            queries: vec![DehydratedQuery {
                query_key: QueryKey::notes(1, "", "x"),
                query_hash: QueryKey::notes(1, "", "x").hash(),
                state: QueryState::success(serde_json::json!("</script><b>&"), 1),
            }],
        };

        let json = state.to_script_json().expect("encode");
        assert!(!json.contains("</script>"));
        assert!(json.contains("\\u003c/script\\u003e"));
        let decoded: Value = serde_json::from_str(&json).expect("still valid json");
        assert_eq!(
            decoded["queries"][0]["state"]["data"],
            serde_json::json!("</script><b>&")
        );
    }
}
