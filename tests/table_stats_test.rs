use anyhow::Result;

mod common;
use common::{int_tuple, open_test_db};

use corvusdb::execution::PredOp;
use corvusdb::optimizer::TableStats;
use corvusdb::storage::tuple::{Field, Tuple, TupleDesc, Type};
use corvusdb::TransactionId;

const EPS: f64 = 0.05;

#[test]
fn test_scan_cost_and_cardinality() -> Result<()> {
    let fixture = open_test_db(50)?;
    let desc = common::int_desc();
    let table_id = fixture.create_table("costs", desc.clone())?;
    let pool = fixture.db.buffer_pool();

    let tid = TransactionId::new();
    for i in 0..100 {
        pool.insert_tuple(tid, table_id, int_tuple(&desc, i, i * 2))?;
    }
    pool.transaction_complete(tid, true)?;

    let stats = TableStats::new(pool, table_id, 1000.0)?;
    let num_pages = fixture.db.catalog().database_file(table_id)?.num_pages()?;

    assert_eq!(stats.total_tuples(), 100);
    assert_eq!(stats.estimate_scan_cost(), num_pages as f64 * 1000.0);
    assert_eq!(stats.estimate_table_cardinality(0.5), 50);
    assert_eq!(stats.estimate_table_cardinality(0.0), 0);
    assert_eq!(stats.estimate_table_cardinality(1.0), 100);
    Ok(())
}

#[test]
fn test_selectivity_estimates_on_uniform_column() -> Result<()> {
    let fixture = open_test_db(50)?;
    let desc = common::int_desc();
    let table_id = fixture.create_table("uniform", desc.clone())?;
    let pool = fixture.db.buffer_pool();

    // Column a uniform over 1..=100
    let tid = TransactionId::new();
    for i in 1..=100 {
        pool.insert_tuple(tid, table_id, int_tuple(&desc, i, 0))?;
    }
    pool.transaction_complete(tid, true)?;

    let stats = TableStats::new(pool, table_id, 1000.0)?;

    let half = stats.estimate_selectivity(0, PredOp::LessThan, &Field::Int(51))?;
    assert!((half - 0.5).abs() < EPS, "got {}", half);

    let none = stats.estimate_selectivity(0, PredOp::GreaterThan, &Field::Int(100))?;
    assert_eq!(none, 0.0);

    let all = stats.estimate_selectivity(0, PredOp::GreaterThanOrEq, &Field::Int(1))?;
    assert!((all - 1.0).abs() < EPS, "got {}", all);

    let avg = stats.avg_selectivity(0, PredOp::Equals)?;
    assert!((avg - 1.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_selectivity_on_string_column() -> Result<()> {
    let fixture = open_test_db(50)?;
    let desc = TupleDesc::new(
        vec![Type::Int, Type::Text],
        vec!["id".to_string(), "name".to_string()],
    );
    let table_id = fixture.create_table("labels", desc.clone())?;
    let pool = fixture.db.buffer_pool();

    let tid = TransactionId::new();
    for (i, name) in ["alpha", "beta", "gamma", "delta"].iter().enumerate() {
        pool.insert_tuple(
            tid,
            table_id,
            Tuple::new(
                desc.clone(),
                vec![Field::Int(i as i32), Field::Text(name.to_string())],
            ),
        )?;
    }
    pool.transaction_complete(tid, true)?;

    let stats = TableStats::new(pool, table_id, 1000.0)?;
    let sel = stats.estimate_selectivity(1, PredOp::LessThan, &Field::Text("zzzz".to_string()))?;
    assert!(sel > 0.9, "got {}", sel);

    // Type mismatch between column and constant is an error
    assert!(stats
        .estimate_selectivity(1, PredOp::Equals, &Field::Int(1))
        .is_err());
    Ok(())
}

#[test]
fn test_stats_on_empty_table() -> Result<()> {
    let fixture = open_test_db(50)?;
    let table_id = fixture.create_table("void", common::int_desc())?;
    let pool = fixture.db.buffer_pool();

    let stats = TableStats::new(pool, table_id, 1000.0)?;
    assert_eq!(stats.total_tuples(), 0);
    assert_eq!(stats.estimate_scan_cost(), 0.0);
    assert_eq!(stats.estimate_table_cardinality(0.7), 0);
    assert_eq!(
        stats.estimate_selectivity(0, PredOp::Equals, &Field::Int(5))?,
        0.0
    );
    Ok(())
}

#[test]
fn test_compute_statistics_covers_all_tables() -> Result<()> {
    let fixture = open_test_db(50)?;
    let desc = common::int_desc();
    let t1 = fixture.create_table("first", desc.clone())?;
    let t2 = fixture.create_table("second", desc.clone())?;
    let pool = fixture.db.buffer_pool();

    let tid = TransactionId::new();
    for i in 0..5 {
        pool.insert_tuple(tid, t1, int_tuple(&desc, i, 0))?;
    }
    for i in 0..9 {
        pool.insert_tuple(tid, t2, int_tuple(&desc, i, 0))?;
    }
    pool.transaction_complete(tid, true)?;

    let stats = fixture.db.compute_statistics(1000.0)?;
    assert_eq!(stats.len(), 2);
    assert_eq!(stats["first"].total_tuples(), 5);
    assert_eq!(stats["second"].total_tuples(), 9);
    Ok(())
}
