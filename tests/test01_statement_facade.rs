use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use sql_mapper::prelude::*;
use sql_mapper::test_utils::ScriptedSession;
use tokio::runtime::Runtime;

mod common;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    id: i64,
    val: String,
}

sql_mapper::mapped_record!(Entry);

fn entry_row(id: i64, val: &str) -> MappedRow {
    MappedRow::from_pairs([
        ("id", RowValues::Int(id)),
        ("val", RowValues::Text(val.to_owned())),
    ])
}

#[test]
fn select_one_absent_row_is_none() -> Result<(), Box<dyn std::error::Error>> {
    common::init_tracing();
    let rt = Runtime::new()?;
    rt.block_on(async {
        let find = SelectOneBy::<i64, Entry>::new(
            "entry.find",
            "SELECT id, val FROM entry WHERE id = #{id}",
        );
        let session = ScriptedSession::new().with_rows("entry.find", Vec::new());

        let found = find.apply(&session, &7).await?;
        assert_eq!(found, None);

        let calls = session.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].operation, "select_one");
        assert_eq!(calls[0].id, "entry.find");
        assert_eq!(calls[0].params, Params::Single(RowValues::Int(7)));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn select_one_maps_single_row() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let find = SelectOne::<Entry>::new("entry.first", "SELECT id, val FROM entry LIMIT 1");
        let session = ScriptedSession::new().with_rows("entry.first", vec![entry_row(1, "a")]);

        let found = find.apply(&session).await?;
        assert_eq!(
            found,
            Some(Entry {
                id: 1,
                val: "a".into()
            })
        );
        assert_eq!(session.calls()[0].params, Params::None);
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn select_one_with_many_rows_fails() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let find = SelectOne::<Entry>::new("entry.any", "SELECT id, val FROM entry");
        let session = ScriptedSession::new()
            .with_rows("entry.any", vec![entry_row(1, "a"), entry_row(2, "b")]);

        let err = find.apply(&session).await.unwrap_err();
        assert!(matches!(
            err,
            SqlMapperError::TooManyResults { ref id, found: 2 } if id == "entry.any"
        ));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn select_one_by_map_forwards_named_parameters() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let find = SelectOneByMap::<String>::new(
            "entry.valFor",
            "SELECT val FROM entry WHERE id = #{id} AND val <> #{skip}",
        );
        let session = ScriptedSession::new().with_rows(
            "entry.valFor",
            vec![MappedRow::from_pairs([("val", RowValues::Text("b".into()))])],
        );
        let params = ParamMap::from([
            ("id".to_owned(), RowValues::Int(2)),
            ("skip".to_owned(), RowValues::Text("a".into())),
        ]);

        let found = find.apply(&session, &params).await?;
        assert_eq!(found.as_deref(), Some("b"));
        assert_eq!(session.calls()[0].params, Params::Named(params));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn list_keeps_engine_order() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let all = SelectList::<Entry>::new("entry.all", "SELECT id, val FROM entry");
        let session = ScriptedSession::new().with_rows(
            "entry.all",
            vec![entry_row(3, "c"), entry_row(1, "a"), entry_row(2, "b")],
        );

        let ids: Vec<i64> = all.apply(&session).await?.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);

        let empty = ScriptedSession::new().with_rows("entry.all", Vec::new());
        assert!(all.apply(&empty).await?.is_empty());
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn page_bounds_reach_the_session_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let page = SelectListPageBy::<String, Entry>::new(
            "entry.page",
            "SELECT id, val FROM entry WHERE val > #{val}",
        );
        let rows = (1..=30).map(|i| entry_row(i, "x")).collect();
        let session = ScriptedSession::new().with_rows("entry.page", rows);

        let bounds = PagingBounds::new(10, 5);
        let got = page.apply(&session, &"a".to_owned(), bounds).await?;
        assert_eq!(
            got.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![11, 12, 13, 14, 15]
        );

        let calls = session.calls();
        let call = &calls[0];
        assert_eq!(call.bounds, Some(bounds));
        assert_eq!(call.params, Params::Single(RowValues::Text("a".into())));

        let unpaged = SelectListBy::<String, Entry>::new(
            "entry.page",
            "SELECT id, val FROM entry WHERE val > #{val}",
        );
        assert_eq!(unpaged.apply(&session, &"a".to_owned()).await?.len(), 30);
        assert_eq!(session.calls()[1].bounds, Some(PagingBounds::UNBOUNDED));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn map_keeps_the_last_row_for_a_key() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let by_id = SelectMap::<i64, Entry>::new("entry.byId", "SELECT id, val FROM entry", "id");
        let session = ScriptedSession::new().with_rows(
            "entry.byId",
            vec![entry_row(5, "v1"), entry_row(6, "w"), entry_row(5, "v2")],
        );

        let map = by_id.apply(&session).await?;
        assert_eq!(map.len(), 2);
        assert_eq!(map[&5].val, "v2");
        assert_eq!(map[&6].val, "w");
        assert_eq!(session.calls()[0].key_field.as_deref(), Some("id"));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn paged_map_variants_window_before_keying() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let rows: Vec<MappedRow> = (1..=6).map(|i| entry_row(i, "x")).collect();
        let session = ScriptedSession::new().with_rows("entry.map", rows);

        let page = SelectMapPage::<i64, Entry>::new("entry.map", "SELECT id, val FROM entry", "id");
        let map = page.apply(&session, PagingBounds::new(4, 10)).await?;
        let mut keys: Vec<i64> = map.into_keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![5, 6]);

        let by = SelectMapBy::<i64, String, Entry>::new(
            "entry.map",
            "SELECT id, val FROM entry WHERE id > #{min}",
            "val",
        );
        let by_val = by.apply(&session, &0).await?;
        assert_eq!(by_val.len(), 1);
        assert_eq!(by_val["x"].id, 6);

        let page_by = SelectMapPageBy::<i64, i64, Entry>::new(
            "entry.map",
            "SELECT id, val FROM entry WHERE id > #{min}",
            "id",
        );
        let map = page_by.apply(&session, &0, PagingBounds::new(0, 2)).await?;
        assert_eq!(map.len(), 2);
        assert_eq!(session.calls()[2].bounds, Some(PagingBounds::new(0, 2)));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn map_without_key_field_is_a_mapping_error() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let by_code =
            SelectMap::<String, Entry>::new("entry.byCode", "SELECT id, val FROM entry", "code");
        let session = ScriptedSession::new().with_rows("entry.byCode", vec![entry_row(1, "a")]);

        let err = by_code.apply(&session).await.unwrap_err();
        assert!(matches!(err, SqlMapperError::ResultMapping(_)));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn handle_delivers_each_row_as_it_is_produced() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let all = SelectList::<Entry>::new("entry.all", "SELECT id, val FROM entry");
        let rows = (1..=4).map(|i| entry_row(i, "x")).collect();
        let session = ScriptedSession::new().with_rows("entry.all", rows);

        let mut seen = Vec::new();
        let delivered = all
            .handle(&session, |entry| {
                // Nothing is read ahead of the callback.
                assert_eq!(session.produced(), seen.len() + 1);
                seen.push(entry.id);
                Ok(ControlFlow::Continue(()))
            })
            .await?;
        assert_eq!(delivered, 4);
        assert_eq!(seen, vec![1, 2, 3, 4]);
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn handle_stops_when_callback_breaks() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let page = SelectListPage::<Entry>::new("entry.all", "SELECT id, val FROM entry");
        let rows = (1..=10).map(|i| entry_row(i, "x")).collect();
        let session = ScriptedSession::new().with_rows("entry.all", rows);

        let mut seen = Vec::new();
        let delivered = page
            .handle(&session, PagingBounds::new(2, 5), |entry| {
                seen.push(entry.id);
                Ok(if seen.len() == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                })
            })
            .await?;
        assert_eq!(delivered, 2);
        assert_eq!(seen, vec![3, 4]);
        assert_eq!(session.produced(), 2);
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn handle_propagates_callback_error() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let by = SelectListBy::<i64, Entry>::new(
            "entry.since",
            "SELECT id, val FROM entry WHERE id >= #{id}",
        );
        let rows = (1..=3).map(|i| entry_row(i, "x")).collect();
        let session = ScriptedSession::new().with_rows("entry.since", rows);

        let err = by
            .handle(&session, &1, |_entry| Err(SqlMapperError::Other("stop".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, SqlMapperError::Other(ref m) if m == "stop"));
        assert_eq!(session.produced(), 1);
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn insert_reports_engine_row_count() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let insert = Insert::<Entry>::new(
            "entry.insert",
            "INSERT INTO entry(id, val) VALUES(#{id}, #{val})",
        );
        let session =
            ScriptedSession::new().with_insert("entry.insert", InsertOutcome::rows(1));

        let entry = Entry {
            id: 9,
            val: "z".into(),
        };
        assert_eq!(insert.apply(&session, &entry).await?, 1);

        let calls = session.calls();
        let Params::Named(sent) = &calls[0].params else {
            panic!("records are sent as named parameters");
        };
        assert_eq!(sent.get("val"), Some(&RowValues::Text("z".into())));

        let bulk = ScriptedSession::new().with_insert("entry.insert", InsertOutcome::rows(3));
        assert_eq!(insert.apply(&bulk, &entry).await?, 3);
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn insert_writes_back_generated_key() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let outcome = InsertOutcome {
            rows_affected: 1,
            generated_key: Some(RowValues::Int(42)),
        };
        let session = ScriptedSession::new().with_insert("entry.insert", outcome);

        let keyed = Insert::<ParamMap>::new("entry.insert", "INSERT INTO entry(val) VALUES(#{val})")
            .key_generator(KeyGenerator::generated("id"));
        let mut params = ParamMap::from([("val".to_owned(), RowValues::Text("k".into()))]);
        assert_eq!(keyed.apply_and_fetch_key(&session, &mut params).await?, 1);
        assert_eq!(params.get("id"), Some(&RowValues::Int(42)));

        let plain =
            Insert::<ParamMap>::new("entry.insert", "INSERT INTO entry(val) VALUES(#{val})");
        let mut untouched = ParamMap::from([("val".to_owned(), RowValues::Text("k".into()))]);
        plain.apply_and_fetch_key(&session, &mut untouched).await?;
        assert!(!untouched.contains_key("id"));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn session_errors_pass_through_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let session = ScriptedSession::new().with_failure("entry.broken", "disk full");

        let insert = Insert::<i64>::new("entry.broken", "INSERT INTO entry(id) VALUES(#{id})");
        let err = insert.apply(&session, &1).await.unwrap_err();
        assert!(matches!(err, SqlMapperError::ExecutionError(ref m) if m == "disk full"));

        let list = SelectList::<Entry>::new("entry.broken", "SELECT id, val FROM entry");
        let err = list.apply(&session).await.unwrap_err();
        assert!(matches!(err, SqlMapperError::ExecutionError(_)));

        let missing = SelectList::<Entry>::new("entry.nowhere", "SELECT id, val FROM entry");
        let err = missing.apply(&session).await.unwrap_err();
        assert!(matches!(err, SqlMapperError::UnknownStatement(ref id) if id == "entry.nowhere"));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn statements_run_against_a_dyn_session() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let scripted = ScriptedSession::new().with_rows(
            "entry.count",
            vec![MappedRow::from_pairs([("n", RowValues::Int(12))])],
        );
        let session: &dyn Session = &scripted;

        let count = SelectOne::<i64>::new("entry.count", "SELECT COUNT(*) AS n FROM entry");
        assert_eq!(count.apply(session).await?, Some(12));
        assert_eq!(count.id(), "entry.count");
        assert_eq!(count.meta().result_type().name(), "i64");
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn statement_attributes_are_recorded() {
    let list = SelectListByMap::<Entry>::new(
        "entry.search",
        "SELECT id, val FROM entry WHERE val = #{val}",
    )
    .result_map("entryMap")
    .fetch_size(256)
    .result_set_type(ResultSetType::ForwardOnly)
    .use_cache(false)
    .flush_cache(true);
    let meta = list.meta();
    assert_eq!(meta.result_map(), Some("entryMap"));
    assert_eq!(meta.fetch_size(), Some(256));
    assert_eq!(meta.result_set_type(), ResultSetType::ForwardOnly);
    assert!(!meta.use_cache());
    assert!(meta.flush_cache());
    assert!(format!("{list:?}").contains("entry.search"));

    let insert = Insert::<Entry>::new("entry.insert", "INSERT INTO entry(id) VALUES(#{id})");
    assert!(insert.meta().flush_cache());
    assert!(insert.meta().key_generator().is_none());
    assert!(insert.meta().result_type().is_void());
}

#[test]
fn retyped_statement_is_rejected_before_the_call() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let insert = Insert::<ParamMap>::new(
            "entry.insert",
            "INSERT INTO entry(id, val) VALUES(#{id}, #{val})",
        );
        let find = SelectOneBy::<i64, Entry>::new(
            "entry.find",
            "SELECT id, val FROM entry WHERE id = #{id}",
        );
        let configuration = Configuration::builder().add(&insert).add(&find).build()?;
        let session = ScriptedSession::new()
            .with_configuration(configuration)
            .with_insert("entry.insert", InsertOutcome::rows(1))
            .with_rows("entry.find", vec![entry_row(1, "a")]);

        let retyped = Insert::<i64>::new("entry.insert", "whatever");
        let err = retyped.apply(&session, &5).await.unwrap_err();
        assert!(matches!(err, SqlMapperError::ConfigError(_)));

        let wrong_result = SelectOneBy::<i64, String>::new("entry.find", "SELECT val FROM entry");
        let err = wrong_result.apply(&session, &1).await.unwrap_err();
        assert!(matches!(err, SqlMapperError::ConfigError(_)));
        assert!(session.calls().is_empty());

        let params = ParamMap::from([
            ("id".to_owned(), RowValues::Int(2)),
            ("val".to_owned(), RowValues::Text("b".into())),
        ]);
        assert_eq!(insert.apply(&session, &params).await?, 1);
        assert_eq!(find.apply(&session, &1).await?.map(|e| e.id), Some(1));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn select_one_all_null_row_is_none() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let max_id = SelectOne::<i64>::new("entry.maxId", "SELECT MAX(id) FROM entry");
        let session = ScriptedSession::new().with_rows(
            "entry.maxId",
            vec![MappedRow::from_pairs([("MAX(id)", RowValues::Null)])],
        );
        assert_eq!(max_id.apply(&session).await?, None);

        let partly_null = SelectOne::<Entry>::new("entry.partial", "SELECT id, val FROM entry");
        let session = ScriptedSession::new().with_rows(
            "entry.partial",
            vec![MappedRow::from_pairs([
                ("id", RowValues::Null),
                ("val", RowValues::Text("a".into())),
            ])],
        );
        // Only an all-NULL row reads as absent.
        assert!(partly_null.apply(&session).await.is_err());
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}
