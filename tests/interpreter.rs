#[cfg(test)]
mod interpreter_tests {
    use lox_treewalk as lox;

    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::scanner::scan_tokens;

    /// Scan, parse, and interpret `source` against fresh global state.
    /// Returns everything `print` wrote plus the runtime error, if any.
    fn run(source: &str) -> (String, Option<String>) {
        let (tokens, lex_errors) = scan_tokens(source.as_bytes());
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

        let (statements, parse_errors) = Parser::new(&tokens).parse();
        assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);

        let mut interpreter = Interpreter::with_output(Vec::new());
        let result = interpreter.interpret(&statements);

        let output = String::from_utf8(interpreter.into_output()).unwrap();

        (output, result.err().map(|e| e.to_string()))
    }

    fn run_ok(source: &str) -> String {
        let (output, error) = run(source);
        assert!(error.is_none(), "unexpected runtime error: {:?}", error);
        output
    }

    // ── arithmetic & precedence ─────────────────────────────────────────

    #[test]
    fn multiplication_before_addition() {
        assert_eq!(run_ok("print 1 + 2 * 3;"), "7\n");
    }

    #[test]
    fn grouping_overrides_precedence() {
        assert_eq!(run_ok("print (1 + 2) * 3;"), "9\n");
    }

    #[test]
    fn subtraction_and_division_associate_left() {
        assert_eq!(run_ok("print 1 - 2 - 3;"), "-4\n");
        assert_eq!(run_ok("print 8 / 4 / 2;"), "1\n");
    }

    #[test]
    fn unary_minus_and_bang() {
        assert_eq!(run_ok("print -(3 + 4);"), "-7\n");
        assert_eq!(run_ok("print !nil;"), "true\n");
        assert_eq!(run_ok("print !0;"), "false\n");
    }

    #[test]
    fn numbers_print_without_redundant_decimals() {
        assert_eq!(run_ok("print 2 + 2;"), "4\n");
        assert_eq!(run_ok("print 2.5 + 0.25;"), "2.75\n");
    }

    // ── strings ─────────────────────────────────────────────────────────

    #[test]
    fn string_concatenation() {
        assert_eq!(run_ok("print \"a\" + \"b\";"), "ab\n");
    }

    #[test]
    fn mixed_plus_is_a_type_mismatch() {
        let (output, error) = run("print 1 + \"a\";");

        assert_eq!(output, "");
        let error = error.expect("expected runtime error");
        assert!(
            error.contains("Operands must be two numbers or two strings."),
            "got: {}",
            error
        );
        assert!(error.contains("[line 1]"), "got: {}", error);
    }

    #[test]
    fn comparison_rejects_strings() {
        let (_, error) = run("print \"a\" < \"b\";");

        assert!(error
            .expect("expected runtime error")
            .contains("Operands must be numbers."));
    }

    #[test]
    fn unary_minus_rejects_strings() {
        let (_, error) = run("print -\"a\";");

        assert!(error
            .expect("expected runtime error")
            .contains("Operand must be a number."));
    }

    // ── equality & truthiness ───────────────────────────────────────────

    #[test]
    fn equality_rules() {
        assert_eq!(run_ok("print nil == nil;"), "true\n");
        assert_eq!(run_ok("print 1 == 1;"), "true\n");
        assert_eq!(run_ok("print 1 == \"1\";"), "false\n");
        assert_eq!(run_ok("print nil == false;"), "false\n");
        assert_eq!(run_ok("print \"a\" != \"b\";"), "true\n");
    }

    #[test]
    fn zero_and_empty_string_are_truthy() {
        assert_eq!(run_ok("if (0) print \"yes\"; else print \"no\";"), "yes\n");
        assert_eq!(run_ok("if (\"\") print \"yes\"; else print \"no\";"), "yes\n");
    }

    // ── variables & scoping ─────────────────────────────────────────────

    #[test]
    fn block_shadowing_leaves_outer_binding_intact() {
        assert_eq!(
            run_ok("var a = 1; { var a = 2; print a; } print a;"),
            "2\n1\n"
        );
    }

    #[test]
    fn assignment_mutates_the_nearest_defining_scope() {
        assert_eq!(run_ok("var a = 1; { a = 2; } print a;"), "2\n");
    }

    #[test]
    fn assignment_evaluates_to_the_assigned_value() {
        assert_eq!(run_ok("var a = 1; print a = 2;"), "2\n");
    }

    #[test]
    fn var_without_initializer_is_nil() {
        assert_eq!(run_ok("var a; print a;"), "nil\n");
    }

    #[test]
    fn undefined_variable_read_fails() {
        let (_, error) = run("print ghost;");

        let error = error.expect("expected runtime error");
        assert!(error.contains("Undefined variable 'ghost'."), "got: {}", error);
    }

    #[test]
    fn assignment_never_creates_a_binding() {
        let (_, error) = run("ghost = 1;");

        assert!(error
            .expect("expected runtime error")
            .contains("Undefined variable 'ghost'."));
    }

    // ── control flow ────────────────────────────────────────────────────

    #[test]
    fn while_loop_reevaluates_its_condition() {
        assert_eq!(
            run_ok("var i = 3; while (i > 0) { print i; i = i - 1; }"),
            "3\n2\n1\n"
        );
    }

    #[test]
    fn for_loop_desugaring_runs_like_a_while() {
        assert_eq!(
            run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn short_circuit_and_skips_the_right_operand() {
        // 1/0 faults when evaluated; short-circuiting must not reach it.
        assert_eq!(run_ok("print false and (1/0);"), "false\n");
    }

    #[test]
    fn short_circuit_or_skips_the_right_operand() {
        assert_eq!(run_ok("print true or (1/0);"), "true\n");
    }

    #[test]
    fn logical_operators_return_the_last_operand_evaluated() {
        assert_eq!(run_ok("print \"a\" or \"b\";"), "a\n");
        assert_eq!(run_ok("print nil or \"b\";"), "b\n");
        assert_eq!(run_ok("print 1 and 2;"), "2\n");
        assert_eq!(run_ok("print nil and 2;"), "nil\n");
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let (_, error) = run("print 1 / 0;");

        assert!(error
            .expect("expected runtime error")
            .contains("Division by zero."));
    }

    // ── functions & closures ────────────────────────────────────────────

    #[test]
    fn function_call_returns_its_value() {
        assert_eq!(
            run_ok("fun add(a, b) { return a + b; } print add(1, 2);"),
            "3\n"
        );
    }

    #[test]
    fn function_without_return_yields_nil() {
        assert_eq!(run_ok("fun noop() {} print noop();"), "nil\n");
    }

    #[test]
    fn return_unwinds_out_of_nested_blocks_and_loops() {
        assert_eq!(
            run_ok(
                "fun first() { for (var i = 0; i < 10; i = i + 1) { if (i == 2) return i; } } \
                 print first();"
            ),
            "2\n"
        );
    }

    #[test]
    fn closure_sees_later_mutation_of_its_captured_variable() {
        assert_eq!(
            run_ok("var x = 1; fun f() { print x; } x = 2; f();"),
            "2\n"
        );
    }

    #[test]
    fn closure_captures_the_defining_scope_not_the_callers() {
        // The classic counter: `i` lives on in the closure after
        // make_counter has returned.
        assert_eq!(
            run_ok(
                "fun make_counter() { var i = 0; fun count() { i = i + 1; print i; } return count; } \
                 var counter = make_counter(); counter(); counter();"
            ),
            "1\n2\n"
        );
    }

    #[test]
    fn parameters_shadow_globals_during_the_call_only() {
        assert_eq!(
            run_ok("var a = \"global\"; fun f(a) { print a; } f(\"local\"); print a;"),
            "local\nglobal\n"
        );
    }

    #[test]
    fn recursion_works() {
        assert_eq!(
            run_ok("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10);"),
            "55\n"
        );
    }

    #[test]
    fn arity_is_checked_at_the_call_site() {
        let (_, error) = run("fun f(a, b) {} f(1);");

        assert!(error
            .expect("expected runtime error")
            .contains("Expected 2 arguments but got 1."));
    }

    #[test]
    fn only_callables_can_be_called() {
        let (_, error) = run("\"not a function\"();");

        assert!(error
            .expect("expected runtime error")
            .contains("Can only call functions and classes."));
    }

    #[test]
    fn function_values_print_by_name() {
        assert_eq!(run_ok("fun f() {} print f;"), "<fn f>\n");
    }

    #[test]
    fn native_clock_returns_a_number() {
        assert_eq!(run_ok("print clock() > 0;"), "true\n");
    }

    #[test]
    fn top_level_return_is_a_runtime_error() {
        let (_, error) = run("return 1;");

        assert!(error
            .expect("expected runtime error")
            .contains("Cannot return from top-level code."));
    }

    // ── error semantics ─────────────────────────────────────────────────

    #[test]
    fn runtime_error_aborts_the_rest_of_the_run_but_prior_output_stands() {
        let (output, error) = run("print 1; print \"a\" + 1; print 2;");

        assert_eq!(output, "1\n");
        assert!(error.is_some());
    }

    #[test]
    fn block_environment_is_restored_after_a_failing_statement() {
        // `a` resolves in the outer scope again after the block faults.
        let (output, error) = run("var a = 1; { var a = 2; ghost; } print a;");

        assert_eq!(output, "");
        assert!(error.unwrap().contains("Undefined variable 'ghost'."));
    }

    #[test]
    fn class_declarations_are_parsed_but_not_executable() {
        let (_, error) = run("class Pie {}");

        assert!(error
            .expect("expected runtime error")
            .contains("Classes are not yet supported."));
    }

    // ── §-style black-box properties ────────────────────────────────────

    #[test]
    fn interpreting_twice_against_fresh_state_is_idempotent() {
        let source = "var a = 1; fun inc() { a = a + 1; return a; } print inc(); print inc(); print a;";

        let first = run_ok(source);
        let second = run_ok(source);

        assert_eq!(first, second);
        assert_eq!(first, "2\n3\n3\n");
    }
}
