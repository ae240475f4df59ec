use serde_json::json;

use expr_engine::{
    create, create_with, sync_fn, EngineOptions, ExprEngine, ExprEngineError, ExprError,
    HelperRegistry, RestrictionRule,
};

fn engine_with_now() -> ExprEngine {
    let engine = create();
    engine
        .add_helper("$now", sync_fn(|_, _| Ok(json!(1_700_000_000_000_i64))))
        .unwrap();
    engine
}

fn restriction_rule(engine: &ExprEngine, src: &str) -> RestrictionRule {
    match engine.compile(src).unwrap_err().kind {
        ExprError::SyntaxRestriction { rule, .. } => rule,
        other => panic!("expected restriction for `{src}`, got {other:?}"),
    }
}

#[test]
fn unresolved_helper_is_reported_by_name() {
    let engine = create_with(EngineOptions::default(), HelperRegistry::new());
    let err = engine.compile("$days($now, $.expiryDate)").unwrap_err();
    match err.kind() {
        ExprError::UnresolvedHelper { name, location } => {
            assert_eq!(name, "$days");
            assert_eq!(location.column, 1);
        }
        other => panic!("expected unresolved helper, got {other:?}"),
    }
    assert_eq!(err.source_text, "$days($now, $.expiryDate)");
    assert!(err.to_string().contains("helper '$days'"));

    let engine = create();
    let err = engine.compile("$days($now, $.expiryDate)").unwrap_err();
    match err.kind() {
        ExprError::UnresolvedHelper { name, .. } => assert_eq!(name, "$now"),
        other => panic!("expected unresolved helper, got {other:?}"),
    }
}

#[test]
fn compiled_expression_exposes_source_and_transformed_form() {
    let engine = engine_with_now();
    let compiled = engine.compile("$days($now, $.expiryDate)").unwrap();
    assert_eq!(compiled.source(), "$days($now, $.expiryDate)");
    assert_eq!(
        compiled.transformed(),
        "await _.$days(_, await _.$now(_), $.expiryDate)"
    );
    assert_eq!(
        compiled.helpers().iter().cloned().collect::<Vec<_>>(),
        vec!["$days".to_string(), "$now".to_string()]
    );
}

#[test]
fn member_chain_after_helper_call_compiles() {
    let engine = engine_with_now();
    let compiled = engine
        .compile("$days($now, $.expiryDate).toFixed(2)")
        .unwrap();
    assert_eq!(
        compiled.transformed(),
        "await _.$days(_, await _.$now(_), $.expiryDate).toFixed(2)"
    );
}

#[test]
fn transformed_form_is_fully_parenthesized() {
    let engine = create();
    let compiled = engine.compile("a + b * -c ? x[0] : 'y'").unwrap();
    assert_eq!(
        compiled.transformed(),
        "(($.a + ($.b * (-$.c))) ? $.x[0] : \"y\")"
    );
}

#[test]
fn reserved_internal_name_is_rejected() {
    let engine = create();
    assert_eq!(
        restriction_rule(&engine, "_.anything()"),
        RestrictionRule::ReservedIdentifier
    );
    assert_eq!(
        restriction_rule(&engine, "a + _"),
        RestrictionRule::ReservedIdentifier
    );
}

#[test]
fn disallowed_syntax_is_rejected_with_its_rule() {
    let engine = create();
    let cases = [
        ("({a: 1})", RestrictionRule::ObjectLiteral),
        ("[...items]", RestrictionRule::Spread),
        ("a = 1", RestrictionRule::Assignment),
        ("a += 1", RestrictionRule::Assignment),
        ("a++", RestrictionRule::Update),
        ("--a", RestrictionRule::Update),
        ("(x) => x", RestrictionRule::ArrowFunction),
        ("new Date()", RestrictionRule::New),
        ("super.x", RestrictionRule::Super),
        ("'a' in obj", RestrictionRule::Operator),
        ("a instanceof B", RestrictionRule::Operator),
        ("typeof a", RestrictionRule::Operator),
        ("void 0", RestrictionRule::Operator),
        ("delete a.b", RestrictionRule::Operator),
    ];
    for (src, rule) in cases {
        assert_eq!(restriction_rule(&engine, src), rule, "for `{src}`");
    }
}

#[test]
fn syntax_errors_carry_locations() {
    let engine = create();
    let err = engine.compile("a +\n  * b").unwrap_err();
    match err.kind() {
        ExprError::Syntax { location, .. } => {
            assert_eq!(location.line, 2);
            assert_eq!(location.column, 3);
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
    assert!(err.transformed.is_none());
}

#[test]
fn statements_and_multiple_expressions_are_rejected() {
    let engine = create();
    for src in ["a; b", "a, b", "1 2", ""] {
        assert!(
            matches!(engine.compile(src).unwrap_err().kind, ExprError::Syntax { .. }),
            "expected syntax error for `{src}`"
        );
    }
}

#[test]
fn helper_names_in_member_position_are_plain_properties() {
    let engine = create_with(EngineOptions::default(), HelperRegistry::new());
    let compiled = engine.compile("row.$missing + row['$missing']").unwrap();
    assert!(compiled.helpers().is_empty());
}

#[test]
fn depth_limit_is_enforced() {
    let options = EngineOptions {
        max_depth: 8,
        ..EngineOptions::default()
    };
    let engine = create_with(options, HelperRegistry::new());
    assert!(engine.compile("((((1))))").is_ok());
    let deep = format!("{}1{}", "(".repeat(20), ")".repeat(20));
    assert!(engine.compile(&deep).is_err());
}

#[test]
fn compiling_twice_yields_equal_artifacts() {
    let engine = engine_with_now();
    let first = engine.compile("$now + 1").unwrap();
    let second = engine.compile("$now + 1").unwrap();
    assert_eq!(first, second);
}

#[test]
fn long_chains_are_rejected_within_source_limit() {
    let engine = create();
    let sum = format!("{}1", "1+".repeat(2047));
    let members = format!("a{}", ".b".repeat(2047));
    for src in [&sum, &members] {
        assert!(src.len() <= 4096);
        let err = engine.compile(src).unwrap_err();
        match err.kind() {
            ExprError::Syntax { message, .. } => assert!(message.contains("maximum depth")),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn long_chains_fail_cleanly_through_exec() {
    let engine = create();
    let ctx = json!({"a": {"b": {}}});
    for src in [
        format!("{}1", "1+".repeat(2047)),
        format!("a{}", ".b".repeat(2047)),
        format!("{}1", "1+".repeat(500)),
    ] {
        let err = engine.exec(&src, &ctx).await.unwrap_err();
        assert!(matches!(
            err,
            ExprEngineError::Compile(ref e) if matches!(e.kind, ExprError::Syntax { .. })
        ));
    }
}

#[test]
fn configured_depth_bounds_operator_chains() {
    let options = EngineOptions {
        max_depth: 4,
        ..EngineOptions::default()
    };
    let engine = create_with(options, HelperRegistry::new());
    assert!(engine.compile("1 + 1 + 1").is_ok());
    let chain = format!("{}1", "1+".repeat(50));
    assert!(engine.compile(&chain).is_err());
}
