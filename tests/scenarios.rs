// End-to-end scenarios exercising the full pipeline (surface syntax ->
// IR-A -> IR-R -> index analysis -> evaluation) against six canonical
// Datalog programs: transitive closure, same-generation, sum/max
// aggregation, record construction/destructuring, stratified negation, and
// an equivalence relation.

use ramlog::config::Config;
use ramlog::eval::exec::eval_statement;
use ramlog::models::relation::{ColumnType, RelationRef, RelationRepr};
use ramlog::models::symbol_table::SymbolTable;
use ramlog::models::value::Value;
use ramlog::pipeline::{compile, run};
use ramlog::surface::parse_program;

#[test]
fn transitive_closure_over_a_chain_of_edges() {
    let symbols = SymbolTable::new();
    let program = parse_program(
        "edge(1,2). edge(2,3). edge(3,4). \
         path(?x,?y) :- edge(?x,?y). \
         path(?x,?z) :- edge(?x,?y), path(?y,?z).",
        &symbols,
    );
    let env = run(&program, Config::default());

    let path = env.get("path").expect("path should be registered");
    assert_eq!(path.size(), 6);
    assert!(path.contains(&[Value::Signed(1), Value::Signed(4)]));
    assert!(!path.contains(&[Value::Signed(4), Value::Signed(1)]));
}

#[test]
fn same_generation_over_a_shared_child_dag() {
    // 1 -> 2, 1 -> 3, 2 -> 4, 3 -> 4: nodes 2 and 3 share child 4, so
    // they're "same generation" even though they aren't siblings directly.
    let symbols = SymbolTable::new();
    let program = parse_program(
        "node(1). node(2). node(3). node(4). \
         edge(1,2). edge(1,3). edge(2,4). edge(3,4). \
         sg(?x,?x) :- node(?x). \
         sg(?x,?y) :- edge(?x,?a), edge(?y,?b), sg(?a,?b).",
        &symbols,
    );
    let env = run(&program, Config::default());

    let sg = env.get("sg").expect("sg should be registered");
    assert!(sg.contains(&[Value::Signed(2), Value::Signed(3)]));
    assert!(sg.contains(&[Value::Signed(3), Value::Signed(2)]));
    assert_eq!(sg.size(), 6); // 4 reflexive pairs + (2,3) + (3,2)
}

#[test]
fn sum_and_max_aggregate_grouped_by_key() {
    let symbols = SymbolTable::new();
    let program = parse_program(
        "score(1,10). score(1,20). score(2,5). \
         total(?k,?s) :- score(?k,_), ?s = sum ?y : score(?k,?y). \
         peak(?k,?m) :- score(?k,_), ?m = max ?y : score(?k,?y).",
        &symbols,
    );
    let env = run(&program, Config::default());

    let total = env.get("total").expect("total should be registered");
    assert!(total.contains(&[Value::Signed(1), Value::Signed(30)]));
    assert!(total.contains(&[Value::Signed(2), Value::Signed(5)]));

    let peak = env.get("peak").expect("peak should be registered");
    assert!(peak.contains(&[Value::Signed(1), Value::Signed(20)]));
    assert!(peak.contains(&[Value::Signed(2), Value::Signed(5)]));
}

#[test]
fn record_construction_then_destructuring_round_trips_the_fields() {
    let symbols = SymbolTable::new();
    let program = parse_program(
        "raw(1,2). raw(3,4). \
         pair(new pair(?x,?y)) :- raw(?x,?y). \
         first(?r,?x) :- pair(?r), ?r = [?x, _].",
        &symbols,
    );
    let (translated, env) = compile(&program, Config::default());
    eval_statement(&translated, &env);

    let first = env.get("first").expect("first should be registered");
    assert_eq!(first.size(), 2);
    for tuple in first.iter_all() {
        let record_id = tuple[0].unsigned_view() as u32;
        let fields = env.records.unpack(record_id, 2);
        assert_eq!(fields[0], tuple[1]);
        match tuple[1] {
            Value::Signed(1) => assert_eq!(fields[1], Value::Signed(2)),
            Value::Signed(3) => assert_eq!(fields[1], Value::Signed(4)),
            other => panic!("unexpected first-column value {other:?}"),
        }
    }
}

#[test]
fn stratified_negation_excludes_blocked_nodes() {
    let symbols = SymbolTable::new();
    let program = parse_program(
        "node(1). node(2). node(3). blocked(2). \
         safe(?x) :- node(?x), !blocked(?x).",
        &symbols,
    );
    let env = run(&program, Config::default());

    let safe = env.get("safe").expect("safe should be registered");
    assert!(safe.contains(&[Value::Signed(1)]));
    assert!(safe.contains(&[Value::Signed(3)]));
    assert!(!safe.contains(&[Value::Signed(2)]));
    assert_eq!(safe.size(), 2);
}

#[test]
fn equivalence_relation_closes_reflexively_symmetrically_and_transitively() {
    let symbols = SymbolTable::new();
    let program = parse_program(
        "same_as(1,2). same_as(2,3). \
         linked(?x,?y) :- same_as(?x,?y).",
        &symbols,
    );
    let (translated, env) = compile(&program, Config::default());
    // Override the pipeline's default BTree representation: `same_as` is
    // an equivalence relation, so its closure should be maintained by
    // union-find rather than stored as exactly the asserted facts.
    env.create(
        RelationRef::new("same_as", vec![ColumnType::Signed, ColumnType::Signed])
            .with_repr(RelationRepr::EqRel),
        vec![],
    );
    eval_statement(&translated, &env);

    let same_as = env.get("same_as").expect("same_as should be registered");
    assert_eq!(same_as.size(), 9); // {1,2,3} forms one class: 3x3 pairs
    assert!(same_as.contains(&[Value::Signed(1), Value::Signed(3)]));
    assert!(same_as.contains(&[Value::Signed(3), Value::Signed(1)]));

    let linked = env.get("linked").expect("linked should be registered");
    assert_eq!(linked.size(), 9);
}
