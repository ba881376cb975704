//! Property-based tests for search and filtering
//!
//! Text search must return exactly the records with a case-insensitive
//! match in alias, host, username, notes or tags, in ascending id order.

use connman_core::crypto::KeyManager;
use connman_core::models::{Connection, ConnectionDraft, ProtocolType};
use connman_core::search::{
    filter_by_protocol, filter_by_tag, search, ConnectionFilter, SearchQuery,
};
use connman_core::store::ConnectionStore;
use proptest::prelude::*;
use tempfile::TempDir;

// ========== Strategies ==========

/// Field values, some containing "prod" in various cases
fn arb_word() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["prod", "PROD", "Production", "web", "db", "lab", "reprod"])
}

/// Strategy for generating tags; protocol names are not valid tags
fn arb_tag() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["prod", "Production", "staging", "dev", "db"])
}

/// Strategy for generating protocol types
fn arb_protocol() -> impl Strategy<Value = ProtocolType> {
    prop::sample::select(ProtocolType::all().to_vec())
}

/// Strategy for one record's searchable fields
fn arb_fields() -> impl Strategy<Value = Fields> {
    (
        arb_word(),
        arb_word(),
        arb_protocol(),
        prop::option::of(arb_word()),
        prop::option::of(arb_word()),
        prop::collection::vec(arb_tag(), 0..3),
    )
        .prop_map(|(alias, host, protocol, username, notes, tags)| Fields {
            alias,
            host,
            protocol,
            username,
            notes,
            tags,
        })
}

#[derive(Debug, Clone)]
struct Fields {
    alias: &'static str,
    host: &'static str,
    protocol: ProtocolType,
    username: Option<&'static str>,
    notes: Option<&'static str>,
    tags: Vec<&'static str>,
}

fn populated_store(temp: &TempDir, records: &[Fields]) -> ConnectionStore {
    let mut store =
        ConnectionStore::open_in_memory(KeyManager::new(temp.path().join("cm.key"))).unwrap();
    for (i, fields) in records.iter().enumerate() {
        let mut draft = ConnectionDraft::new(
            format!("{}-{i}", fields.alias),
            fields.protocol,
            format!("{}.lan", fields.host),
        )
        .with_tags(fields.tags.iter().copied());
        draft.username = fields.username.map(str::to_string);
        draft.notes = fields.notes.map(|n| format!("rack {n}"));
        store.add(draft).unwrap();
    }
    store
}

fn expected_match(connection: &Connection, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let hit = |s: &str| s.to_lowercase().contains(&needle);
    hit(&connection.alias)
        || hit(&connection.host)
        || connection.username.as_deref().is_some_and(hit)
        || connection.notes.as_deref().is_some_and(hit)
        || connection.tags.iter().any(|t| hit(t))
}

fn ids(connections: &[Connection]) -> Vec<i64> {
    connections.iter().map(|c| c.id).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn text_search_returns_exactly_the_matches(
        records in prop::collection::vec(arb_fields(), 0..12),
        needle in prop::sample::select(vec!["prod", "PROD", "Prod", "lab", "rack", "zzz"]),
    ) {
        let temp = TempDir::new().unwrap();
        let store = populated_store(&temp, &records);
        let all = store.list().unwrap();

        let expected: Vec<i64> = all
            .iter()
            .filter(|c| expected_match(c, needle))
            .map(|c| c.id)
            .collect();
        let found = search(&store, needle).unwrap();

        prop_assert_eq!(ids(&found), expected);
    }

    #[test]
    fn empty_search_lists_everything_in_id_order(
        records in prop::collection::vec(arb_fields(), 0..12),
    ) {
        let temp = TempDir::new().unwrap();
        let store = populated_store(&temp, &records);

        let found = ids(&search(&store, "").unwrap());
        prop_assert_eq!(found.len(), records.len());
        prop_assert!(found.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn protocol_and_tag_filters_partition_correctly(
        records in prop::collection::vec(arb_fields(), 1..10),
        protocol in arb_protocol(),
        tag in arb_tag(),
    ) {
        let temp = TempDir::new().unwrap();
        let store = populated_store(&temp, &records);
        let all = store.list().unwrap();

        let by_protocol = filter_by_protocol(&store, protocol).unwrap();
        prop_assert!(by_protocol.iter().all(|c| c.protocol == protocol));
        prop_assert_eq!(
            by_protocol.len(),
            all.iter().filter(|c| c.protocol == protocol).count()
        );

        let by_tag = filter_by_tag(&store, tag).unwrap();
        prop_assert!(by_tag.iter().all(|c| c.has_tag(tag)));
        prop_assert_eq!(by_tag.len(), all.iter().filter(|c| c.has_tag(tag)).count());
    }

    #[test]
    fn query_operators_combine_with_and(
        records in prop::collection::vec(arb_fields(), 1..10),
        protocol in arb_protocol(),
    ) {
        let temp = TempDir::new().unwrap();
        let store = populated_store(&temp, &records);

        let query = SearchQuery::parse(&format!("protocol:{} prod", protocol.as_str())).unwrap();
        let found = query.run(&store).unwrap();

        let expected: Vec<i64> = store
            .list()
            .unwrap()
            .iter()
            .filter(|c| c.protocol == protocol && expected_match(c, "prod"))
            .map(|c| c.id)
            .collect();
        prop_assert_eq!(ids(&found), expected);
    }
}

#[test]
fn protocol_or_tag_filter_prefers_protocol_names() {
    let temp = TempDir::new().unwrap();
    let store = populated_store(
        &temp,
        &[
            Fields {
                alias: "web",
                host: "web",
                protocol: ProtocolType::Http,
                username: None,
                notes: None,
                tags: vec!["prod"],
            },
            Fields {
                alias: "db",
                host: "db",
                protocol: ProtocolType::Ssh,
                username: None,
                notes: None,
                tags: vec![],
            },
        ],
    );

    let ssh = store
        .list_filtered(&ConnectionFilter::ProtocolOrTag("SSH".into()))
        .unwrap();
    assert_eq!(ssh.len(), 1);
    assert_eq!(ssh[0].alias, "db-1");

    let prod = store
        .list_filtered(&ConnectionFilter::ProtocolOrTag("prod".into()))
        .unwrap();
    assert_eq!(prod.len(), 1);
    assert_eq!(prod[0].alias, "web-0");
}

#[test]
fn unknown_protocol_operator_is_rejected() {
    assert!(SearchQuery::parse("protocol:spice").is_err());
    assert!(SearchQuery::parse("tag:").is_err());
}
