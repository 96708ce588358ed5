#[cfg(test)]
mod parser_tests {
    use lox_treewalk as lox;

    use lox::ast::{Expr, LiteralValue, Stmt};
    use lox::ast_printer::AstPrinter;
    use lox::parser::Parser;
    use lox::scanner::scan_tokens;

    /// Parse `source` as a single expression and render it in prefix form.
    fn expr_to_string(source: &str) -> String {
        let (tokens, errors) = scan_tokens(source.as_bytes());
        assert!(errors.is_empty(), "lex errors: {:?}", errors);

        let expr = Parser::new(&tokens)
            .parse_expression()
            .unwrap_or_else(|e| panic!("parse error: {}", e));

        AstPrinter::print(&expr)
    }

    /// Parse `source` as a program, returning the statement count and the
    /// rendered diagnostics.
    fn program_diagnostics(source: &str) -> (usize, Vec<String>) {
        let (tokens, errors) = scan_tokens(source.as_bytes());
        assert!(errors.is_empty(), "lex errors: {:?}", errors);

        let (statements, diagnostics) = Parser::new(&tokens).parse();

        (
            statements.len(),
            diagnostics.iter().map(|e| e.to_string()).collect(),
        )
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(expr_to_string("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
    }

    #[test]
    fn grouping_overrides_precedence() {
        assert_eq!(expr_to_string("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
    }

    #[test]
    fn additive_operators_associate_left() {
        assert_eq!(expr_to_string("1 - 2 - 3"), "(- (- 1.0 2.0) 3.0)");
        assert_eq!(expr_to_string("1 + 2 + 3"), "(+ (+ 1.0 2.0) 3.0)");
    }

    #[test]
    fn multiplicative_operators_associate_left() {
        assert_eq!(expr_to_string("8 / 4 / 2"), "(/ (/ 8.0 4.0) 2.0)");
        assert_eq!(expr_to_string("2 * 3 * 4"), "(* (* 2.0 3.0) 4.0)");
    }

    #[test]
    fn unary_is_right_associative_and_nests() {
        assert_eq!(expr_to_string("!!true"), "(! (! true))");
        assert_eq!(expr_to_string("-1 + 2"), "(+ (- 1.0) 2.0)");
    }

    #[test]
    fn comparison_and_equality_layering() {
        assert_eq!(
            expr_to_string("1 < 2 == 3 >= 4"),
            "(== (< 1.0 2.0) (>= 3.0 4.0))"
        );
    }

    #[test]
    fn logical_operators_produce_logical_nodes() {
        let (tokens, _) = scan_tokens(b"a or b and c");

        let expr = Parser::new(&tokens).parse_expression().unwrap();

        // `and` binds tighter than `or`.
        assert_eq!(AstPrinter::print(&expr), "(or a (and b c))");

        match expr {
            Expr::Logical { .. } => {}
            other => panic!("expected Logical at the root, got {:?}", other),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(expr_to_string("a = b = 1"), "(= a (= b 1.0))");
    }

    #[test]
    fn call_chains_parse() {
        assert_eq!(expr_to_string("f(1)(2, 3)"), "(call (call f 1.0) 2.0 3.0)");
    }

    #[test]
    fn parsing_is_deterministic() {
        let source = "1 + 2 * -3 == (4 / 5)";

        let (tokens, _) = scan_tokens(source.as_bytes());

        let first = Parser::new(&tokens).parse_expression().unwrap();
        let second = Parser::new(&tokens).parse_expression().unwrap();

        assert_eq!(first, second);
        assert_eq!(AstPrinter::print(&first), AstPrinter::print(&second));
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() {
        let (tokens, _) = scan_tokens(b"if (a) if (b) print 1; else print 2;");

        let (statements, diagnostics) = Parser::new(&tokens).parse();
        assert!(diagnostics.is_empty(), "diagnostics: {:?}", diagnostics);
        assert_eq!(statements.len(), 1);

        // The outer if must have no else; the inner one takes it.
        match &statements[0] {
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert!(else_branch.is_none());

                match then_branch.as_ref() {
                    Stmt::If { else_branch, .. } => assert!(else_branch.is_some()),
                    other => panic!("expected nested if, got {:?}", other),
                }
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn for_loop_desugars_to_block_and_while() {
        let (tokens, _) = scan_tokens(b"for (var i = 0; i < 3; i = i + 1) print i;");

        let (statements, diagnostics) = Parser::new(&tokens).parse();
        assert!(diagnostics.is_empty(), "diagnostics: {:?}", diagnostics);
        assert_eq!(statements.len(), 1);

        // Expected shape: Block [ Var, While { body: Block [ Print, Expression ] } ]
        let outer = match &statements[0] {
            Stmt::Block(inner) => inner,
            other => panic!("expected block, got {:?}", other),
        };

        assert_eq!(outer.len(), 2);
        assert!(matches!(outer[0], Stmt::Var { .. }));

        let body = match &outer[1] {
            Stmt::While { body, .. } => body,
            other => panic!("expected while, got {:?}", other),
        };

        match body.as_ref() {
            Stmt::Block(inner) => {
                assert_eq!(inner.len(), 2);
                assert!(matches!(inner[0], Stmt::Print(_)));
                assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
            }
            other => panic!("expected block body, got {:?}", other),
        }
    }

    #[test]
    fn for_loop_without_condition_defaults_to_true() {
        let (tokens, _) = scan_tokens(b"for (;;) print 1;");

        let (statements, diagnostics) = Parser::new(&tokens).parse();
        assert!(diagnostics.is_empty());

        match &statements[0] {
            Stmt::While { condition, .. } => {
                assert_eq!(*condition, Expr::Literal(LiteralValue::True));
            }
            other => panic!("expected bare while, got {:?}", other),
        }
    }

    #[test]
    fn invalid_assignment_target_is_reported_not_fatal() {
        let (tokens, _) = scan_tokens(b"1 + 2 = 3; print 4;");

        let (statements, diagnostics) = Parser::new(&tokens).parse();

        assert_eq!(diagnostics.len(), 1);
        assert!(
            diagnostics[0].to_string().contains("Invalid assignment target"),
            "got: {}",
            diagnostics[0]
        );

        // Both statements survive: the left expression stands in for the
        // malformed assignment.
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn two_malformed_statements_yield_two_diagnostics() {
        let (count, diagnostics) = program_diagnostics("var = 1; var = 2; print 3;");

        assert_eq!(diagnostics.len(), 2, "diagnostics: {:?}", diagnostics);
        assert_eq!(count, 1); // only `print 3;` survives

        for d in &diagnostics {
            assert!(d.contains("Expected variable name"), "got: {}", d);
        }
    }

    #[test]
    fn recovery_resumes_at_statement_keywords() {
        // The garbage after `var` is discarded up to `print`.
        let (count, diagnostics) = program_diagnostics("var 12 34 print \"ok\";");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(count, 1);
    }

    #[test]
    fn missing_closing_brace_is_reported() {
        let (_, diagnostics) = program_diagnostics("{ print 1;");

        assert_eq!(diagnostics.len(), 1);
        assert!(
            diagnostics[0].contains("Expected '}' after block"),
            "got: {}",
            diagnostics[0]
        );
        assert!(diagnostics[0].contains("at end"), "got: {}", diagnostics[0]);
    }

    #[test]
    fn syntax_error_location_qualifier_names_the_token() {
        let (_, diagnostics) = program_diagnostics("print 1");

        assert_eq!(diagnostics.len(), 1);
        assert!(
            diagnostics[0].starts_with("[line 1] Error at end: Expected ';'"),
            "got: {}",
            diagnostics[0]
        );
    }

    #[test]
    fn function_declaration_parses_name_params_and_body() {
        let (tokens, _) = scan_tokens(b"fun add(a, b) { return a + b; }");

        let (statements, diagnostics) = Parser::new(&tokens).parse();
        assert!(diagnostics.is_empty());

        match &statements[0] {
            Stmt::Function(decl) => {
                assert_eq!(decl.name.lexeme, "add");
                assert_eq!(decl.params.len(), 2);
                assert_eq!(decl.body.len(), 1);
                assert!(matches!(decl.body[0], Stmt::Return { .. }));
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn class_declaration_parses_into_the_stub_variant() {
        let (tokens, _) = scan_tokens(b"class Pie < Dessert { taste() { print 1; } }");

        let (statements, diagnostics) = Parser::new(&tokens).parse();
        assert!(diagnostics.is_empty(), "diagnostics: {:?}", diagnostics);

        match &statements[0] {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                assert_eq!(name.lexeme, "Pie");
                assert_eq!(superclass.map(|t| t.lexeme), Some("Dessert"));
                assert_eq!(methods.len(), 1);
                assert_eq!(methods[0].name.lexeme, "taste");
            }
            other => panic!("expected class, got {:?}", other),
        }
    }
}
