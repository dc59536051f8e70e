//! Tests for reordering GDScript members.

use gdsort::{check_members_preserved, sort_source, SortOptions};
use pretty_assertions::assert_eq;

/// Helper to sort without tracking offsets.
fn sort(source: &str) -> String {
    sort_source(source, &[], &SortOptions::default())
        .expect("sorting should succeed")
        .text
}

fn sort_alphabetized(source: &str) -> String {
    sort_source(source, &[], &SortOptions::alphabetized())
        .expect("sorting should succeed")
        .text
}

// ============================================================================
// Top-level ordering
// ============================================================================

#[test]
fn test_reorder_vars_before_methods() {
    let input = r#"extends Node


func foo():
	pass


var x = 1
"#;
    let expected = r#"extends Node

var x = 1


func foo():
	pass
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_reorder_signals_before_vars() {
    let input = r#"extends Node

var x = 1

signal my_signal
"#;
    let expected = r#"extends Node

signal my_signal

var x = 1
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_reorder_consts_before_vars() {
    let input = r#"extends Node

var x = 1

const MAX = 100
"#;
    let expected = r#"extends Node

const MAX = 100

var x = 1
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_variable_modifiers_order() {
    let input = r#"extends Node

@onready var label = $Label
var plain = 1
@export var speed = 2
"#;
    let expected = r#"extends Node

@export var speed = 2

var plain = 1

@onready var label = $Label
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_virtual_method_ordering() {
    let input = r#"extends Node


func _process(delta):
	pass


func _ready():
	pass


func _init():
	pass
"#;
    let expected = r#"extends Node


func _init():
	pass


func _ready():
	pass


func _process(delta):
	pass
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_methods_keep_relative_order() {
    let input = r#"extends Node


func zeta():
	pass


var x = 1


func alpha():
	pass
"#;
    let expected = r#"extends Node

var x = 1


func zeta():
	pass


func alpha():
	pass
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_static_init_before_other_static_methods() {
    let input = r#"extends Node


static func helper():
	pass


static func _static_init():
	pass
"#;
    let expected = r#"extends Node


static func _static_init():
	pass


static func helper():
	pass
"#;
    assert_eq!(sort(input), expected);
}

// ============================================================================
// File header
// ============================================================================

#[test]
fn test_tool_before_class_name() {
    let input = r#"class_name MyClass
@tool
extends Node
"#;
    let expected = r#"@tool
class_name MyClass
extends Node
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_icon_after_tool() {
    let input = r#"@icon("res://icon.png")
@tool
extends Node
"#;
    let expected = r#"@tool
@icon("res://icon.png")
extends Node
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_extends_after_class_name() {
    let input = r#"extends Node
class_name MyClass
"#;
    let expected = r#"class_name MyClass
extends Node
"#;
    assert_eq!(sort(input), expected);
}

// ============================================================================
// Export groups
// ============================================================================

#[test]
fn test_export_group_moves_with_variable() {
    let input = r#"extends Node


func foo():
	pass


@export_group("Movement")
var speed: float = 10.0
"#;
    let expected = r#"extends Node

@export_group("Movement")
var speed: float = 10.0


func foo():
	pass
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_stacked_export_annotations_move_with_variable() {
    let input = r#"extends Node


func foo():
	pass


@export_category("Physics")
@export_group("Movement")
@export_subgroup("Ground")
var speed: float = 10.0
"#;
    let result = sort(input);
    let category = result.find("@export_category").unwrap();
    let group = result.find("@export_group").unwrap();
    let subgroup = result.find("@export_subgroup").unwrap();
    let var = result.find("var speed").unwrap();
    let func = result.find("func foo").unwrap();
    assert!(category < group && group < subgroup && subgroup < var);
    assert!(var < func);
}

#[test]
fn test_alphabetize_orders_by_name_within_kind() {
    let input = r#"extends Node


func zeta():
	pass


func Alpha():
	pass
"#;
    let expected = r#"extends Node


func Alpha():
	pass


func zeta():
	pass
"#;
    assert_eq!(sort_alphabetized(input), expected);
}

// ============================================================================
// Comments and surrounding text
// ============================================================================

#[test]
fn test_comments_travel_with_member() {
    let input = r#"extends Node


func foo():
	pass

# Player speed in pixels.
var speed = 10
"#;
    let expected = r#"extends Node

# Player speed in pixels.
var speed = 10


func foo():
	pass
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_standalone_comments_are_kept() {
    let input = r#"extends Node

func f():
	pass

# ---- Section ----

var x = 1

# trailing note
"#;
    let expected = r#"extends Node

# ---- Section ----

var x = 1


func f():
	pass

# trailing note
"#;
    let result = sort(input);
    assert_eq!(result, expected);
    check_members_preserved(input, &result).expect("nothing lost");
}

#[test]
fn test_doc_comment_moves_with_member() {
    let input = r#"extends Node

func f():
	pass

## Speed in px.
var speed = 1
"#;
    let expected = r#"extends Node

## Speed in px.
var speed = 1


func f():
	pass
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_class_doc_comment_follows_header() {
    let input = r#"extends Node

var x = 1

## This is a class doc comment.
"#;
    let expected = r#"extends Node

## This is a class doc comment.

var x = 1
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_file_preamble_is_kept() {
    let input = r#"# Copyright notice

extends Node


func foo():
	pass


var x = 1
"#;
    let expected = r#"# Copyright notice

extends Node

var x = 1


func foo():
	pass
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_already_sorted_is_untouched() {
    let input = "extends Node\nvar x = 1\nfunc foo():\n\tpass\n";
    let sorted = sort_source(input, &[], &SortOptions::default()).unwrap();
    assert!(!sorted.reordered);
    assert_eq!(sorted.text, input);
}

#[test]
fn test_skip_region_leaves_file_untouched() {
    let input = r#"extends Node

# sort: off
func foo():
	pass
# sort: on

var x = 1
"#;
    assert_eq!(sort(input), input);
}

// ============================================================================
// Inner classes
// ============================================================================

#[test]
fn test_inner_class_members_are_sorted() {
    let input = r#"extends Node


class Inner:
	func foo():
		pass

	var x = 1
"#;
    let expected = r#"extends Node


class Inner:
	var x = 1


	func foo():
		pass
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_inner_class_moves_after_methods() {
    let input = r#"extends Node


class Inner:
	var y = 2


func foo():
	pass
"#;
    let expected = r#"extends Node


func foo():
	pass


class Inner:
	var y = 2
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_inner_class_with_skip_region_is_kept_whole() {
    let input = r#"extends Node


class Inner:
	func foo():
		pass

	# sort: off
	var b = 2
	# sort: on
	var a = 1


var x = 1
"#;
    let expected = r#"extends Node

var x = 1


class Inner:
	func foo():
		pass

	# sort: off
	var b = 2
	# sort: on
	var a = 1
"#;
    assert_eq!(sort(input), expected);
}

#[test]
fn test_sorting_is_idempotent() {
    let input = r#"extends Node


func foo():
	pass


class Inner:
	func bar():
		pass

	const K = 1


signal hit
"#;
    let once = sort(input);
    assert_eq!(sort(&once), once);
    check_members_preserved(input, &once).expect("members preserved");
}

// ============================================================================
// Line endings
// ============================================================================

#[test]
fn test_without_trailing_newline_option_keeps_source_ending() {
    let options = SortOptions {
        trailing_newline: false,
        ..Default::default()
    };
    let input = "func f():\n\tpass\n\n\nvar x = 1\n";
    let sorted = sort_source(input, &[], &options).unwrap();
    assert_eq!(sorted.text, "var x = 1\n\n\nfunc f():\n\tpass\n");

    let unterminated = "func f():\n\tpass\n\n\nvar x = 1";
    let sorted = sort_source(unterminated, &[], &options).unwrap();
    assert_eq!(sorted.text, "var x = 1\n\n\nfunc f():\n\tpass");
}

#[test]
fn test_crlf_line_endings_are_kept() {
    let input = "func f():\r\n\tpass\r\n\r\n\r\nvar x = 1\r\n";
    assert_eq!(sort(input), "var x = 1\r\n\r\n\r\nfunc f():\r\n\tpass\r\n");
}
