use std::sync::Arc;

use anyhow::Result;

mod common;
use common::open_test_db;

use corvusdb::execution::{Aggregate, AggOp, OpIterator, SeqScan, TupleIterator};
use corvusdb::storage::tuple::{Field, Tuple, TupleDesc, Type};
use corvusdb::{DbError, TransactionId};

fn grouped_source() -> (TupleDesc, TupleIterator) {
    // (a, 10), (a, 20), (b, 30) keyed by a text group column
    let desc = TupleDesc::new(
        vec![Type::Text, Type::Int],
        vec!["k".to_string(), "v".to_string()],
    );
    let rows = vec![("a", 10), ("a", 20), ("b", 30)];
    let tuples = rows
        .into_iter()
        .map(|(k, v)| {
            Tuple::new(
                desc.clone(),
                vec![Field::Text(k.to_string()), Field::Int(v)],
            )
        })
        .collect();
    (desc.clone(), TupleIterator::new(desc, tuples))
}

fn collect_groups(agg: &mut Aggregate) -> Result<Vec<(Field, Field)>> {
    agg.open()?;
    let mut out = Vec::new();
    while agg.has_next()? {
        let t = agg.next()?;
        out.push((t.field(0).clone(), t.field(1).clone()));
    }
    agg.close();
    out.sort_by(|x, y| format!("{}", x.0).cmp(&format!("{}", y.0)));
    Ok(out)
}

fn text_group(k: &str, v: i32) -> (Field, Field) {
    (Field::Text(k.to_string()), Field::Int(v))
}

#[test]
fn test_group_by_sum() -> Result<()> {
    let (_, source) = grouped_source();
    let mut agg = Aggregate::new(Box::new(source), 1, Some(0), AggOp::Sum)?;
    assert_eq!(
        collect_groups(&mut agg)?,
        vec![text_group("a", 30), text_group("b", 30)]
    );
    Ok(())
}

#[test]
fn test_group_by_avg_truncates() -> Result<()> {
    let (_, source) = grouped_source();
    let mut agg = Aggregate::new(Box::new(source), 1, Some(0), AggOp::Avg)?;
    assert_eq!(
        collect_groups(&mut agg)?,
        vec![text_group("a", 15), text_group("b", 30)]
    );
    Ok(())
}

#[test]
fn test_group_by_count() -> Result<()> {
    let (_, source) = grouped_source();
    let mut agg = Aggregate::new(Box::new(source), 1, Some(0), AggOp::Count)?;
    assert_eq!(
        collect_groups(&mut agg)?,
        vec![text_group("a", 2), text_group("b", 1)]
    );
    Ok(())
}

#[test]
fn test_group_by_min_max() -> Result<()> {
    let (_, source) = grouped_source();
    let mut agg = Aggregate::new(Box::new(source), 1, Some(0), AggOp::Min)?;
    assert_eq!(
        collect_groups(&mut agg)?,
        vec![text_group("a", 10), text_group("b", 30)]
    );

    let (_, source) = grouped_source();
    let mut agg = Aggregate::new(Box::new(source), 1, Some(0), AggOp::Max)?;
    assert_eq!(
        collect_groups(&mut agg)?,
        vec![text_group("a", 20), text_group("b", 30)]
    );
    Ok(())
}

#[test]
fn test_no_grouping_yields_single_row() -> Result<()> {
    let (_, source) = grouped_source();
    let mut agg = Aggregate::new(Box::new(source), 1, None, AggOp::Sum)?;
    agg.open()?;
    assert!(agg.has_next()?);
    let t = agg.next()?;
    assert_eq!(t.desc().num_fields(), 1);
    assert_eq!(t.field(0), &Field::Int(60));
    assert!(!agg.has_next()?);
    agg.close();
    Ok(())
}

#[test]
fn test_string_count_and_rejection() -> Result<()> {
    // COUNT over the text column works
    let (_, source) = grouped_source();
    let mut agg = Aggregate::new(Box::new(source), 0, Some(0), AggOp::Count)?;
    assert_eq!(
        collect_groups(&mut agg)?,
        vec![text_group("a", 2), text_group("b", 1)]
    );

    // Anything else over a text column is rejected up front
    let (_, source) = grouped_source();
    match Aggregate::new(Box::new(source), 0, Some(0), AggOp::Sum) {
        Err(DbError::InvalidOperation(_)) => {}
        other => panic!("expected rejection, got {:?}", other.err()),
    }
    Ok(())
}

#[test]
fn test_aggregate_output_field_naming() -> Result<()> {
    let (_, source) = grouped_source();
    let agg = Aggregate::new(Box::new(source), 1, Some(0), AggOp::Sum)?;
    let desc = agg.tuple_desc();
    assert_eq!(desc.field_name(0), "k");
    assert_eq!(desc.field_name(1), "SUM(v)");

    let (_, source) = grouped_source();
    let agg = Aggregate::new(Box::new(source), 1, None, AggOp::Avg)?;
    let desc = agg.tuple_desc();
    assert_eq!(desc.num_fields(), 1);
    assert_eq!(desc.field_name(0), "AVG(v)");
    Ok(())
}

#[test]
fn test_aggregate_over_table_scan() -> Result<()> {
    let fixture = open_test_db(50)?;
    let desc = TupleDesc::new(
        vec![Type::Int, Type::Int],
        vec!["g".to_string(), "v".to_string()],
    );
    let table_id = fixture.create_table("sales", desc.clone())?;
    let pool = fixture.db.buffer_pool();

    let tid = TransactionId::new();
    for (g, v) in [(1, 100), (1, 200), (2, 50), (2, 150), (3, 10)] {
        pool.insert_tuple(
            tid,
            table_id,
            Tuple::new(desc.clone(), vec![Field::Int(g), Field::Int(v)]),
        )?;
    }
    pool.transaction_complete(tid, true)?;

    let tid = TransactionId::new();
    let scan = SeqScan::new(Arc::clone(pool), tid, table_id, "s");
    let mut agg = Aggregate::new(Box::new(scan), 1, Some(0), AggOp::Sum)?;
    agg.open()?;
    let mut out = Vec::new();
    while agg.has_next()? {
        let t = agg.next()?;
        out.push((t.field(0).clone(), t.field(1).clone()));
    }
    agg.close();
    pool.transaction_complete(tid, true)?;

    out.sort_by_key(|(g, _)| match g {
        Field::Int(v) => *v,
        _ => 0,
    });
    assert_eq!(
        out,
        vec![
            (Field::Int(1), Field::Int(300)),
            (Field::Int(2), Field::Int(200)),
            (Field::Int(3), Field::Int(10)),
        ]
    );
    Ok(())
}
