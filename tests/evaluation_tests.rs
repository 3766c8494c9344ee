// tests/evaluation_tests.rs

use caraway::{EvaluationError, Expression, ExpressionError, Value};
use rust_decimal::Decimal;

fn evaluate(source: &str) -> Value {
    let expression = Expression::new(source);
    let context = expression.context();
    expression.evaluate(&context).unwrap()
}

fn evaluate_string(source: &str) -> String {
    evaluate(source).to_string()
}

fn evaluation_error(source: &str) -> EvaluationError {
    let expression = Expression::new(source);
    let context = expression.context();
    match expression.evaluate(&context).unwrap_err() {
        ExpressionError::Evaluation(e) => e,
        ExpressionError::Parse(e) => panic!("expected evaluation error, got parse error: {}", e),
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_basic_arithmetic() {
    let test_cases = vec![
        ("1+2", "3"),
        ("6-10", "-4"),
        ("4*6", "24"),
        ("7/2", "3.5"),
        ("7%3", "1"),
        ("2^10", "1024"),
        ("1+2*3", "7"),
        ("(1+2)*3", "9"),
        ("2.12345+1.54321", "3.66666"),
        ("-5+3", "-2"),
        ("--5", "5"),
        ("5!", "120"),
        ("0.1+0.2", "0.3"),
    ];

    for (source, expected) in test_cases {
        assert_eq!(evaluate_string(source), expected, "Failed for: {}", source);
    }
}

#[test]
fn test_power_operator() {
    let test_cases = vec![
        ("2^3^2", "512"),
        ("9^0.5", "3"),
        ("2^-2", "0.25"),
        ("-2^2", "4"),
        ("10^3", "1000"),
    ];

    for (source, expected) in test_cases {
        assert_eq!(evaluate_string(source), expected, "Failed for: {}", source);
    }
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(
        evaluation_error("1/0"),
        EvaluationError::DivisionByZero { position: 2 }
    ));
    assert!(matches!(
        evaluation_error("1%0"),
        EvaluationError::DivisionByZero { .. }
    ));
}

#[test]
fn test_implicit_multiplication() {
    let expression = Expression::new("2a+3(4)");
    let context = expression.context().with("a", 5);
    assert_eq!(expression.evaluate(&context).unwrap(), Value::from(22));
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_string_concatenation() {
    let test_cases = vec![
        (r#""a"+"b""#, "ab"),
        (r#""result"+123"#, "result123"),
        (r#"1+"x""#, "1x"),
        (r#""pi is "+3.14"#, "pi is 3.14"),
        // computed numbers render without padded precision
        (r#"(1+2)+"x""#, "3x"),
        (r#"2^10+" bytes""#, "1024 bytes"),
    ];

    for (source, expected) in test_cases {
        assert_eq!(evaluate_string(source), expected, "Failed for: {}", source);
    }
}

#[test]
fn test_string_functions() {
    let test_cases = vec![
        (r#"STR_UPPER("hello")"#, Value::from("HELLO")),
        (r#"STR_LOWER("HeLLo")"#, Value::from("hello")),
        (r#"STR_TRIM("  x  ")"#, Value::from("x")),
        (r#"STR_LENGTH("hello")"#, Value::from(5)),
        (r#"STR_CONTAINS("Hello World", "world")"#, Value::from(true)),
        (r#"STR_STARTS_WITH("hello", "he")"#, Value::from(true)),
        (r#"STR_ENDS_WITH("hello", "he")"#, Value::from(false)),
        (r#"STR_SUBSTRING("hello", 1, 3)"#, Value::from("el")),
        (r#"STR_SUBSTRING("hello", 3)"#, Value::from("lo")),
        (r#"STR_MATCHES("2024-01-01", "^\\d{4}-\\d{2}-\\d{2}$")"#, Value::from(true)),
    ];

    for (source, expected) in test_cases {
        assert_eq!(evaluate(source), expected, "Failed for: {}", source);
    }
}

// ============================================================================
// Comparisons and Equality
// ============================================================================

#[test]
fn test_comparisons() {
    let test_cases = vec![
        ("1<2", true),
        ("2<=2", true),
        ("3>4", false),
        ("4>=4", true),
        ("1==1", true),
        ("1=1", true),
        ("1!=2", true),
        ("70==70.0", true),
        (r#""abc"<"abd""#, true),
        (r#""5"==5"#, true),
        (r#""x"==5"#, false),
        ("TRUE>FALSE", true),
    ];

    for (source, expected) in test_cases {
        assert_eq!(
            evaluate(source),
            Value::from(expected),
            "Failed for: {}",
            source
        );
    }
}

#[test]
fn test_null_equality_is_total_but_ordering_fails() {
    assert_eq!(evaluate("NULL==NULL"), Value::from(true));
    assert_eq!(evaluate("NULL==1"), Value::from(false));
    assert_eq!(evaluate("NULL!=1"), Value::from(true));
    assert!(matches!(
        evaluation_error("NULL>1"),
        EvaluationError::NullComparison { .. }
    ));
    assert!(matches!(
        evaluation_error("1<=NULL"),
        EvaluationError::NullComparison { .. }
    ));
}

// ============================================================================
// Boolean Operators and Short-Circuiting
// ============================================================================

#[test]
fn test_boolean_operators() {
    let test_cases = vec![
        ("TRUE&&TRUE", true),
        ("TRUE&&FALSE", false),
        ("FALSE||TRUE", true),
        ("FALSE||FALSE", false),
        ("!TRUE", false),
        ("!FALSE", true),
        ("1&&1", true),
        ("0||0", false),
        ("1>0&&2>1", true),
    ];

    for (source, expected) in test_cases {
        assert_eq!(
            evaluate(source),
            Value::from(expected),
            "Failed for: {}",
            source
        );
    }
}

#[test]
fn test_short_circuit_skips_right_operand() {
    // the right side would divide by zero if it were evaluated
    assert_eq!(evaluate("FALSE && 1/0 > 1"), Value::from(false));
    assert_eq!(evaluate("TRUE || 1/0 > 1"), Value::from(true));

    let expression = Expression::new("a > 0 && 10/a > 1");
    let context = expression.context().with("a", 0);
    assert_eq!(expression.evaluate(&context).unwrap(), Value::from(false));
}

// ============================================================================
// Lazy Functions
// ============================================================================

#[test]
fn test_if_evaluates_only_the_taken_branch() {
    assert_eq!(evaluate("IF(1, 4/2, 4/0)"), Value::from(2));
    assert_eq!(evaluate("IF(0, 4/0, 4/2)"), Value::from(2));
}

#[test]
fn test_switch_evaluates_only_the_matching_case() {
    assert_eq!(
        evaluate(r#"SWITCH("BR", "BR", "result"+123, "DE", 3/0, 2/0)"#),
        Value::from("result123")
    );
    assert_eq!(
        evaluate(r#"SWITCH("XX", "BR", 1/0, "DE", 2/0, 42)"#),
        Value::from(42)
    );
    assert_eq!(evaluate(r#"SWITCH("XX", "BR", 1)"#), Value::Null);
}

#[test]
fn test_coalesce_returns_first_non_null() {
    assert_eq!(evaluate("COALESCE(NULL, NULL, 5, 1/0)"), Value::from(5));
    assert_eq!(evaluate("COALESCE(NULL, NULL)"), Value::Null);
}

// ============================================================================
// Numeric Functions
// ============================================================================

#[test]
fn test_numeric_functions() {
    let test_cases = vec![
        ("ABS(-5)", "5"),
        ("CEILING(2.1)", "3"),
        ("FLOOR(2.9)", "2"),
        ("ROUND(2.145, 2)", "2.14"),
        ("SQRT(9)", "3"),
        ("MIN(3, 1, 2)", "1"),
        ("MAX(3, 1, 2)", "3"),
        ("SUM(1, 2, 3, 4)", "10"),
        ("AVERAGE(1, 2, 3)", "2"),
        ("FACT(5)", "120"),
        ("NOT(0)", "true"),
    ];

    for (source, expected) in test_cases {
        assert_eq!(evaluate_string(source), expected, "Failed for: {}", source);
    }
}

#[test]
fn test_aggregates_recurse_into_arrays() {
    let expression = Expression::new("SUM(values, 10)");
    let context = expression
        .context()
        .with("values", vec![Value::from(1), Value::from(2), Value::from(3)]);
    assert_eq!(expression.evaluate(&context).unwrap(), Value::from(16));
}

#[test]
fn test_argument_validation() {
    assert!(matches!(
        evaluation_error("SQRT(-1)"),
        EvaluationError::InvalidArgument { .. }
    ));
    assert!(matches!(
        evaluation_error("LOG(0)"),
        EvaluationError::InvalidArgument { .. }
    ));
    assert!(matches!(
        evaluation_error("FACT(-3)"),
        EvaluationError::InvalidArgument { .. }
    ));
}

#[test]
fn test_random_is_in_unit_interval() {
    for _ in 0..20 {
        let value = evaluate("RANDOM()").as_number().unwrap();
        assert!(value >= Decimal::ZERO && value < Decimal::ONE);
    }
}

// ============================================================================
// Arrays and Structures
// ============================================================================

#[test]
fn test_array_indexing() {
    let rows = Value::Array(vec![
        Value::Array(vec![Value::from(1), Value::from(2)]),
        Value::Array(vec![Value::from(4), Value::from(8)]),
    ]);

    let expression = Expression::new("a[1][0]");
    let context = expression.context().with("a", rows.clone());
    assert_eq!(expression.evaluate(&context).unwrap(), Value::from(4));

    let out_of_range = Expression::new("a[5]");
    let context = out_of_range.context().with("a", rows);
    match out_of_range.evaluate(&context).unwrap_err() {
        ExpressionError::Evaluation(EvaluationError::IndexOutOfBounds { index, .. }) => {
            assert_eq!(index, "5");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_string_indexing_yields_single_characters() {
    let expression = Expression::new("word[1]");
    let context = expression.context().with("word", "abc");
    assert_eq!(expression.evaluate(&context).unwrap(), Value::from("b"));
}

#[test]
fn test_structure_field_access() {
    let order = Value::from_json(&serde_json::json!({
        "id": 42,
        "customer": {"name": "Ada"},
        "total": 99.5,
    }));

    let expression = Expression::new("order.total + 0.5");
    let context = expression.context().with("order", order.clone());
    assert_eq!(expression.evaluate(&context).unwrap(), Value::from(100));

    let nested = Expression::new("order.customer.name");
    let context = nested.context().with("order", order.clone());
    assert_eq!(nested.evaluate(&context).unwrap(), Value::from("Ada"));

    let missing = Expression::new("order.missing");
    let context = missing.context().with("order", order);
    match missing.evaluate(&context).unwrap_err() {
        ExpressionError::Evaluation(EvaluationError::FieldNotFound { field, .. }) => {
            assert_eq!(field, "missing");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_indexing_into_structure_field() {
    let data = Value::from_json(&serde_json::json!({"items": [10, 20, 30]}));
    let expression = Expression::new("data.items[2]");
    let context = expression.context().with("data", data);
    assert_eq!(expression.evaluate(&context).unwrap(), Value::from(30));
}

// ============================================================================
// Date-Time and Durations
// ============================================================================

#[test]
fn test_datetime_functions() {
    assert_eq!(evaluate("DT_EPOCH(DT_DATE_NEW(1970, 1, 1))"), Value::from(0));
    assert_eq!(
        evaluate("DT_DURATION_MILLIS(DT_DURATION_NEW(0, 0, 0, 1))"),
        Value::from(1000)
    );
    assert_eq!(
        evaluate(r#"DT_DURATION_MILLIS(DT_DURATION_PARSE("PT1M30S"))"#),
        Value::from(90_000)
    );
    assert_eq!(
        evaluate(r#"DT_FORMAT(DT_PARSE("2024-03-01"), "%Y/%m/%d")"#),
        Value::from("2024/03/01")
    );
}

#[test]
fn test_datetime_arithmetic() {
    // one day later
    assert_eq!(
        evaluate("DT_EPOCH(DT_DATE_NEW(2024, 3, 1) + DT_DURATION_NEW(1)) - DT_EPOCH(DT_DATE_NEW(2024, 3, 1))"),
        Value::from(86_400_000)
    );
    // difference of two instants is a duration
    assert_eq!(
        evaluate("DT_DURATION_MILLIS(DT_DATE_NEW(2024, 3, 2) - DT_DATE_NEW(2024, 3, 1))"),
        Value::from(86_400_000)
    );
    assert_eq!(
        evaluate("DT_DATE_NEW(2024, 3, 1) < DT_DATE_NEW(2024, 3, 2)"),
        Value::from(true)
    );
}

#[test]
fn test_invalid_datetime_arguments() {
    assert!(matches!(
        evaluation_error("DT_DATE_NEW(2024, 13, 1)"),
        EvaluationError::InvalidArgument { .. }
    ));
    assert!(matches!(
        evaluation_error(r#"DT_PARSE("not a date")"#),
        EvaluationError::InvalidArgument { .. }
    ));
    assert!(matches!(
        evaluation_error(r#"DT_DURATION_PARSE("nonsense")"#),
        EvaluationError::InvalidArgument { .. }
    ));
}

// ============================================================================
// Variables and Errors
// ============================================================================

#[test]
fn test_unresolved_variable() {
    let error = evaluation_error("1 + missing");
    assert_eq!(
        error.to_string(),
        "Variable or constant value for 'missing' not found"
    );
    assert_eq!(error.position(), 5);
}

#[test]
fn test_constants_can_be_shadowed_by_default() {
    let expression = Expression::new("PI");
    let context = expression.context().with("PI", 3);
    assert_eq!(expression.evaluate(&context).unwrap(), Value::from(3));
}

#[test]
fn test_unsupported_operations_carry_positions() {
    let expression = Expression::new("a - b");
    let context = expression.context().with("a", "x").with("b", "y");
    match expression.evaluate(&context).unwrap_err() {
        ExpressionError::Evaluation(EvaluationError::UnsupportedDataType { position, .. }) => {
            assert_eq!(position, 3);
        }
        other => panic!("unexpected error: {}", other),
    }
}
