use fieldmap::{
    ConfigFactory, ConfigStore, ConstraintRegistry, DataField, EngineError, EngineOptions,
    MemoryStore, SchemaIndex, WidgetConfig, Workbench,
};
use serde_json::json;
use std::time::{Duration, Instant};

fn title_schema() -> SchemaIndex {
    SchemaIndex::from_value(&json!({
        "title": {
            "type": "text",
            "fields": ["keyword"],
            "originalFields": {"keyword": {"type": "keyword"}}
        }
    }))
    .expect("valid mapping")
}

fn bench() -> Workbench<MemoryStore> {
    Workbench::new(
        title_schema(),
        ConstraintRegistry::builtin().clone(),
        MemoryStore::default(),
    )
}

#[test]
fn scenario_a_keyword_variant_inherits_search_weight() {
    let mut bench = bench();
    let editor = bench.attach("search", "search").unwrap();
    assert_eq!(editor.config().root_fields, ["title"]);

    bench.begin_edit("search").unwrap().set_weight(0, "3").unwrap();
    bench.commit("search").unwrap();

    let resolved = bench.editor("search").unwrap().resolved().unwrap();
    assert_eq!(
        resolved.data_field,
        DataField::Multiple(vec!["title".to_string(), "title.keyword".to_string()])
    );
    assert_eq!(resolved.field_weights, Some(vec![3, 3]));
}

#[test]
fn scenario_b_filter_binds_to_keyword_variant() {
    let schema = title_schema();
    let registry = ConstraintRegistry::builtin();
    let config = ConfigFactory::new(registry)
        .default_config("genres", "filter", &schema)
        .unwrap();
    assert_eq!(config.root_fields, ["title"]);

    let filter = registry.constraint_for("filter").unwrap();
    let resolver = fieldmap::FieldResolver::new(&schema, &filter);
    assert_eq!(resolver.expand(&config.root_fields), ["title.keyword"]);
    assert_eq!(
        resolver.resolve(&config).unwrap().data_field,
        DataField::Single(Some("title.keyword".to_string()))
    );
}

#[test]
fn scenario_c_last_row_cannot_be_removed() {
    let mut bench = bench();
    bench.attach("search", "search").unwrap();
    let session = bench.begin_edit("search").unwrap();
    let before = session.draft().clone();
    assert_eq!(session.remove_root_field_row(0), Ok(false));
    assert_eq!(session.draft(), &before);
    assert_eq!(session.notice(), "");
}

#[test]
fn scenario_d_invalid_weight_keeps_previous_draft() {
    let mut bench = bench();
    bench.attach("search", "search").unwrap();
    let session = bench.begin_edit("search").unwrap();
    session.set_aux_value("placeholder", "Find a book").unwrap();
    let before = session.draft().clone();

    let err = session.set_weight(0, "abc").unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidWeight {
            raw: "abc".to_string()
        }
    );
    assert_eq!(session.draft(), &before);
    assert!(!session.notice().is_empty());

    let committed = bench.commit("search").unwrap();
    assert_eq!(committed, before);
    assert_eq!(committed.field_weights, Some(vec![2]));
}

#[test]
fn discard_right_after_open_leaves_store_untouched() {
    let mut bench = bench();
    bench.attach("search", "search").unwrap();
    let stored = serde_json::to_vec(bench.store().get("search").unwrap()).unwrap();

    bench.begin_edit("search").unwrap();
    bench.discard("search").unwrap();

    let after = serde_json::to_vec(bench.store().get("search").unwrap()).unwrap();
    assert_eq!(stored, after);
    assert_eq!(bench.store().commit_count(), 0);
}

#[test]
fn notice_expires_on_tick() {
    let mut bench = bench();
    bench.attach("search", "search").unwrap();
    let session = bench.begin_edit("search").unwrap();
    assert!(session.select_root_field_at(0, "missing").is_err());
    let deadline = session.notifier().expires_at().unwrap();
    assert!(!session.notice().is_empty());

    bench.tick(deadline - Duration::from_millis(1));
    assert!(!bench.session_mut("search").unwrap().notice().is_empty());
    bench.tick(deadline.max(Instant::now()));
    assert_eq!(bench.session_mut("search").unwrap().notice(), "");
}

#[derive(Default)]
struct RecordingStore {
    events: Vec<String>,
}

impl ConfigStore for RecordingStore {
    fn on_commit(&mut self, widget_id: &str, config: &WidgetConfig) {
        self.events
            .push(format!("commit {widget_id} {}", config.root_fields.join(",")));
    }

    fn on_delete(&mut self, widget_id: &str) {
        self.events.push(format!("delete {widget_id}"));
    }
}

#[test]
fn store_sees_one_commit_per_successful_commit() {
    let schema = SchemaIndex::from_value(&json!({
        "title": {"type": "text"},
        "author": {"type": "text"}
    }))
    .unwrap();
    let mut bench = Workbench::new(
        schema,
        ConstraintRegistry::builtin().clone(),
        RecordingStore::default(),
    );
    bench.attach("search", "search").unwrap();

    bench.begin_edit("search").unwrap().add_root_field_row();
    bench.commit("search").unwrap();
    assert!(bench.commit("search").is_err());

    bench.begin_edit("search").unwrap();
    bench.discard("search").unwrap();
    bench.delete("search").unwrap();

    assert_eq!(
        bench.store().events,
        ["commit search title,author", "delete search"]
    );
}

#[test]
fn never_expiring_notices_do_not_break_rejections() {
    let mut bench =
        bench().with_options(EngineOptions::default().with_notice_ttl(Duration::MAX));
    bench.attach("search", "search").unwrap();
    let session = bench.begin_edit("search").unwrap();
    assert!(matches!(
        session.set_weight(0, "abc"),
        Err(EngineError::InvalidWeight { .. })
    ));
    assert!(session.notice_ticket().is_some());
    bench.tick(Instant::now());
    assert!(!bench.session_mut("search").unwrap().notice().is_empty());

    bench.commit("search").unwrap();
    let store = bench.into_store();
    assert_eq!(store.commit_count(), 1);
    assert_eq!(
        store.get("search").unwrap().field_weights,
        Some(vec![2])
    );
}
