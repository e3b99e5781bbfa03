//! 约束检查与规则执行性能基准测试

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rule_engine::{
    Condition, Constraint, ConstraintChecker, Criteria, Operator, Rule, RuleCompiler,
    RuleExecutor, RuleNode,
};
use serde_json::{json, Value};
use std::hint::black_box;

/// 数值比较操作基准
fn bench_numeric_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("numeric_operations");

    let field = json!(1000);
    let expected = json!(500);

    for operator in [
        Operator::Equal,
        Operator::NotEqual,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
    ] {
        group.bench_function(operator.as_str(), |b| {
            b.iter(|| {
                ConstraintChecker::evaluate(
                    black_box(&field),
                    black_box(operator),
                    black_box(&expected),
                )
            })
        });
    }

    group.finish();
}

/// in 操作符随列表长度的变化
fn bench_in_operator_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("in_operator_scaling");

    let field = json!("target");

    for size in [5, 10, 50, 100, 500].iter() {
        let list: Vec<Value> = (0..*size)
            .map(|i| {
                if i == size - 1 {
                    json!("target")
                } else {
                    json!(format!("item_{}", i))
                }
            })
            .collect();
        let list_value = Value::Array(list);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                ConstraintChecker::evaluate(
                    black_box(&field),
                    black_box(Operator::In),
                    black_box(&list_value),
                )
            })
        });
    }

    group.finish();
}

/// 字段缺失时的快速返回
fn bench_missing_field(c: &mut Criterion) {
    let constraint = Constraint::new("absent", Operator::NotEqual, "x");
    let criteria = Criteria::from_value(json!({"present": "y"})).unwrap();

    c.bench_function("missing_field", |b| {
        b.iter(|| ConstraintChecker::check(black_box(&constraint), black_box(&criteria)))
    });
}

/// 构造深度为 depth 的嵌套 all 条件
fn nested_condition(depth: usize) -> Condition {
    let mut condition = Condition::all(vec![Constraint::new("a", Operator::Equal, 1).into()]);
    for _ in 1..depth {
        condition = Condition::all(vec![
            RuleNode::Condition(condition),
            Constraint::new("b", Operator::LessThan, 10).into(),
        ]);
    }
    condition
}

/// 规则执行随嵌套深度的变化
fn bench_execute_nesting(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute_nesting");
    let criteria = Criteria::from_value(json!({"a": 1, "b": 5})).unwrap();
    let executor = RuleExecutor::new();

    for depth in [1usize, 4, 16, 32].iter() {
        let rule = Rule::new(vec![nested_condition(*depth).with_result("hit")]);

        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, _| {
            b.iter(|| executor.execute(black_box(&rule), black_box(&criteria)))
        });
    }

    group.finish();
}

/// 编译原始 JSON 规则
fn bench_compile(c: &mut Criterion) {
    let raw = json!({
        "conditions": [
            {"any": [{"all": [{"field": "Category", "operator": "equal", "value": "Islamic"}]}], "result": 4},
            {"any": [
                {"field": "Leverage", "operator": "greaterThanOrEqual", "value": 1000},
                {"all": [
                    {"field": "Monetization", "operator": "equal", "value": "Real"},
                    {"field": "Leverage", "operator": "lessThanOrEqual", "value": 200},
                    {"any": [{"field": "CountryIso", "operator": "in", "value": ["GB", "FI"]}]}
                ]}
            ], "result": 3}
        ],
        "default": 2
    });
    let compiler = RuleCompiler::default();

    c.bench_function("compile_nested_rule", |b| {
        b.iter(|| compiler.compile(black_box(&raw)))
    });
}

criterion_group!(
    benches,
    bench_numeric_operations,
    bench_in_operator_scaling,
    bench_missing_field,
    bench_execute_nesting,
    bench_compile,
);

criterion_main!(benches);
