//! Running flat programs in-process.

use indoc::indoc;

use lazyc::codegen::CodegenOptions;
use lazyc::error::{Error, RuntimeError};
use lazyc::interp::EvalLimits;
use lazyc::ir::intrinsic::is_operator_name;
use lazyc::ir::Intrinsic;
use lazyc::{compile, CompileOptions, EmitKind};

fn run_opts(src: &str, direct: bool) -> Result<String, Error> {
    let options = CompileOptions {
        emit: EmitKind::Run,
        codegen: CodegenOptions {
            direct_intrinsic_calls: direct,
        },
        ..CompileOptions::default()
    };
    compile(src, &options)
}

fn run(src: &str) -> String {
    run_opts(src, true).expect("program failed")
}

fn runtime_error(src: &str) -> RuntimeError {
    match run_opts(src, true) {
        Err(Error::Runtime(e)) => e,
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn end_to_end_prints_six() {
    let src = indoc! {"
        f x = x * 2
        main = show (f 3)
    "};
    assert_eq!(run(src), "6\n");
}

#[test]
fn put_str_ln_result_is_not_printed() {
    assert_eq!(run("main = putStrLn \"hello, world\""), "hello, world\n");
}

#[test]
fn only_the_taken_branch_is_evaluated() {
    assert_eq!(run("main = if True then 1 else (1 / 0)"), "1\n");
    assert_eq!(run("main = if False then 1 `div` 0 else 2"), "2\n");
}

#[test]
fn shared_partial_application_is_not_mutated() {
    let src = indoc! {"
        both g = g 10 * 100 + g 20
        main = both ((+) 1)
    "};
    assert_eq!(run(src), "1121\n");
}

#[test]
fn mutual_recursion_through_the_global_table() {
    let src = indoc! {"
        isEven n = if n == 0 then True else isOdd (n - 1)
        isOdd n = if n == 0 then False else isEven (n - 1)
        main = isEven 10
    "};
    assert_eq!(run(src), "1\n");
}

#[test]
fn nested_lambdas_capture_enclosing_parameters() {
    let src = indoc! {"
        adder n = \\x -> x + n
        twice f x = f (f x)
        main = twice (adder 3) 4
    "};
    assert_eq!(run(src), "10\n");
}

#[test]
fn local_functions_see_outer_parameters() {
    let src = indoc! {"
        f y = g 2 + g 3
          where g x = x * y
        main = f 10
    "};
    assert_eq!(run(src), "50\n");
}

#[test]
fn local_recursive_function() {
    let src = indoc! {"
        sumTo n = let go i acc = if i > n then acc else go (i + 1) (acc + i)
                  in go 1 0
        main = sumTo 100
    "};
    assert_eq!(run(src), "5050\n");
}

#[test]
fn saturation_does_not_change_results() {
    let programs = [
        "main = show (1 + 2 * 3 - 4 `mod` 3)",
        "main = (negate 5) * 2",
        "sq x = x * x\nmain = sq (sq 3) == 81",
        "apply f x = f x\nmain = apply negate 7",
        "main = let inc = (+) 1 in inc (inc 1)",
        "fact n = if n <= 1 then 1 else n * fact (n - 1)\nmain = fact 12",
    ];
    for src in programs {
        let direct = run_opts(src, true).unwrap();
        let generic = run_opts(src, false).unwrap();
        assert_eq!(direct, generic, "{}", src);
    }
}

/// Argument lists exercising one intrinsic.
fn sample_arguments(intrinsic: Intrinsic) -> Vec<Vec<&'static str>> {
    match intrinsic {
        Intrinsic::Negate => vec![vec!["5"], vec!["(-3)"], vec!["0"]],
        Intrinsic::Show => vec![vec!["42"], vec!["(-8)"], vec!["\"s\""]],
        Intrinsic::PutStrLn => vec![vec!["\"hi\""], vec!["\"\""]],
        Intrinsic::Eq | Intrinsic::Neq => vec![
            vec!["3", "3"],
            vec!["3", "4"],
            vec!["\"a\"", "\"a\""],
            vec!["\"a\"", "\"b\""],
        ],
        _ => vec![
            vec!["7", "2"],
            vec!["(-7)", "2"],
            vec!["3", "3"],
            vec!["0", "5"],
            vec!["2", "(-9)"],
        ],
    }
}

#[test]
fn every_intrinsic_agrees_on_both_call_paths() {
    for intrinsic in Intrinsic::ALL {
        let name = intrinsic.source_names()[0];
        let head = if is_operator_name(name) {
            format!("({})", name)
        } else {
            name.to_owned()
        };
        for args in sample_arguments(intrinsic) {
            assert_eq!(args.len(), intrinsic.arity());
            let src = format!("main = {} {}", head, args.join(" "));
            let direct = run_opts(&src, true).unwrap_or_else(|e| panic!("{}: {}", src, e));
            let generic = run_opts(&src, false).unwrap_or_else(|e| panic!("{}: {}", src, e));
            assert_eq!(direct, generic, "{}", src);
        }
    }
    assert_eq!(run("main = (-7) `div` 2"), "-3\n");
    assert_eq!(run("main = (-7) `mod` 2"), "-1\n");
}

#[test]
fn closures_and_constructors_print_as_placeholders() {
    assert_eq!(run("main = (+) 1"), "<closure>\n");
    assert_eq!(run("main = Just"), "<con 1>\n");
    assert_eq!(run("main = ()"), "");
}

#[test]
fn division_by_zero() {
    assert_eq!(runtime_error("main = 1 `div` 0"), RuntimeError::DivisionByZero);
    assert_eq!(runtime_error("main = 5 `mod` 0"), RuntimeError::DivisionByZero);
}

#[test]
fn applying_a_non_closure() {
    assert_eq!(
        runtime_error("main = 1 2"),
        RuntimeError::NotAClosure { found: "int" }
    );
}

#[test]
fn arity_beyond_the_runtime_limit() {
    let src = indoc! {"
        wide a b c d e g h i j = a
        main = wide 1 2 3 4 5 6 7 8 9
    "};
    assert_eq!(runtime_error(src), RuntimeError::UnsupportedArity { arity: 9 });
}

#[test]
fn operand_type_errors() {
    let err = runtime_error("main = 1 + \"one\"");
    assert_eq!(err.to_string(), "plus expects int, found string");
}

#[test]
fn depth_limit_is_configurable() {
    let options = CompileOptions {
        emit: EmitKind::Run,
        limits: EvalLimits { max_depth: 16 },
        ..CompileOptions::default()
    };
    let src = "count n = if n == 0 then 0 else 1 + count (n - 1)\nmain = count 100";
    match compile(src, &options) {
        Err(Error::Runtime(RuntimeError::StackOverflow { limit })) => assert_eq!(limit, 16),
        other => panic!("expected stack overflow, got {:?}", other),
    }
    assert_eq!(
        compile("count n = if n == 0 then 0 else 1 + count (n - 1)\nmain = count 10", &options)
            .unwrap(),
        "10\n"
    );
}
