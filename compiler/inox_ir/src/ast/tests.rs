use pretty_assertions::assert_eq;

use crate::{AstBuilder, BinaryOp, NodeKind};

#[test]
fn children_follow_source_order() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let two = b.int(2);
    let sum = b.binary(BinaryOp::Add, one, two);
    let ast = b.finish();
    assert_eq!(ast.kind(sum).children().to_vec(), vec![one, two]);
}

#[test]
fn positions_use_the_node_source() {
    let mut b = AstBuilder::new("main.ix", "a\nimport ./lib.ix");
    let main_stmt = b.at(2, 18).int(0);
    b.add_source("/lib.ix", "\n\n  1");
    let included = b.at(4, 5).int(1);
    let ast = b.finish();
    assert_eq!(ast.position(main_stmt).to_string(), "main.ix:2:1");
    assert_eq!(ast.position(included).to_string(), "/lib.ix:3:3");
}

#[test]
fn simple_literals_are_recognized() {
    assert!(NodeKind::IntLiteral(1).is_simple_value_literal());
    assert!(NodeKind::StringLiteral("a".into()).is_simple_value_literal());
    assert!(!NodeKind::IdentifierLiteral("a".into()).is_simple_value_literal());
}
