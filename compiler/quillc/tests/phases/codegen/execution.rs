//! Behavior of generated code, observed by running it.

use pretty_assertions::assert_eq;

use crate::common::{run, run_main, run_main_with_input, run_with_input, Trap, Value};

// -- Arithmetic --

#[test]
fn add_two_ints() {
    let result = run(
        "function add(a: int, b: int): int { return a + b; }",
        "add",
        "(II)I",
        vec![Value::Int(2), Value::Int(3)],
    );
    assert_eq!(result, Some(Value::Int(5)));
}

#[test]
fn int_arithmetic_wraps_and_truncates() {
    let out = run_main(
        "function main(): void {
            var max: int = 2147483647;
            writeln(max + 1);
            writeln(-7 / 2);
            writeln(-7 % 2);
            writeln(-2147483648);
        }",
    );
    assert_eq!(out, "-2147483648\n-3\n-1\n-2147483648\n");
}

#[test]
fn mixed_arithmetic_widens_the_int_side() {
    let out = run_main(
        "function main(): void {
            writeln(7 / 2 * 1.0);
            writeln(7 * 1.0 / 2);
            writeln(1 < 1.5);
            writeln(2 == 2.0);
        }",
    );
    assert_eq!(out, "3.0\n3.5\ntrue\ntrue\n");
}

#[test]
fn division_by_zero_traps() {
    let result = run_with_input(
        "function f(a: int, b: int): int { return a / b; }",
        "f",
        "(II)I",
        vec![Value::Int(1), Value::Int(0)],
        "",
    );
    assert_eq!(result, Err(Trap::Arithmetic));
}

// -- Control flow --

#[test]
fn logical_operators_short_circuit() {
    let out = run_main(
        "var calls: int = 0;
         function side(): bool { calls = calls + 1; writeln(\"side\"); return true; }
         function main(): void {
            if (false && side()) { writeln(\"and\"); }
            if (true || side()) { writeln(\"or\"); }
            writeln(calls);
         }",
    );
    assert_eq!(out, "or\n0\n");
}

#[test]
fn logical_values_can_be_stored() {
    let out = run_main(
        "function main(): void {
            var a: bool = 1 < 2 && !(3 < 2);
            var b: bool = a && false || 2 != 2;
            writeln(a);
            writeln(b);
        }",
    );
    assert_eq!(out, "true\nfalse\n");
}

#[test]
fn recursion() {
    let result = run(
        "function fib(n: int): int {
            if (n < 2) { return n; }
            return fib(n - 1) + fib(n - 2);
         }",
        "fib",
        "(I)I",
        vec![Value::Int(15)],
    );
    assert_eq!(result, Some(Value::Int(610)));
}

#[test]
fn while_loop() {
    let result = run(
        "function sum(n: int): int {
            var i: int = 1;
            var total: int;
            while (i <= n) { total = total + i; i = i + 1; }
            return total;
         }",
        "sum",
        "(I)I",
        vec![Value::Int(100)],
    );
    assert_eq!(result, Some(Value::Int(5050)));
}

#[test]
fn for_loop_stops_before_the_bound() {
    let out = run_main(
        "function main(): void {
            var i: int;
            for (i, 0, 10, 3) { write(i); write(\" \"); }
            writeln();
            writeln(i);
        }",
    );
    assert_eq!(out, "0 3 6 9 \n12\n");
}

#[test]
fn for_loop_bound_is_evaluated_every_iteration() {
    let out = run_main(
        "var limit: int = 3;
         function main(): void {
            var i: int;
            for (i, 0, limit, 1) { limit = 5; write(i); }
            writeln();
         }",
    );
    assert_eq!(out, "01234\n");
}

#[test]
fn float_for_loop_steps_by_a_fraction() {
    let out = run_main(
        "function main(): void {
            var x: float;
            for (x, 0, 2, 0.5) { write(x); write(\" \"); }
            writeln();
            writeln(x);
        }",
    );
    assert_eq!(out, "0.0 0.5 1.0 1.5 \n2.0\n");
}

#[test]
fn float_for_loop_with_nan_bound_never_runs() {
    let out = run_main(
        "function main(): void {
            var x: float;
            var zero: float = 0.0;
            for (x, 0, zero / zero, 1) { writeln(x); }
            writeln(\"done\");
        }",
    );
    assert_eq!(out, "done\n");
}

#[test]
fn operands_are_evaluated_left_to_right() {
    let out = run_main(
        "var counter: int = 0;
         function next(): int { counter = counter + 1; return counter; }
         function main(): void {
            writeln(next() - next());
            var a: int[] = array [3] of int;
            a[next() - 3] = next();
            writeln(a[0]);
         }",
    );
    assert_eq!(out, "-1\n4\n");
}

#[test]
fn assignment_is_an_expression() {
    let out = run_main(
        "function main(): void {
            var x: int;
            var y: int;
            x = y = 21;
            writeln(x + y);
        }",
    );
    assert_eq!(out, "42\n");
}

#[test]
fn deep_recursion_is_not_limited_by_the_compiler() {
    let result = run(
        "function depth(n: int): int { if (n == 0) { return 0; } return 1 + depth(n - 1); }",
        "depth",
        "(I)I",
        vec![Value::Int(3000)],
    );
    assert_eq!(result, Some(Value::Int(3000)));
}

#[test]
fn runaway_recursion_overflows() {
    let result = run_with_input(
        "function down(n: int): int { return down(n + 1); }",
        "down",
        "(I)I",
        vec![Value::Int(0)],
        "",
    );
    assert_eq!(result, Err(Trap::StackOverflow));
}

// -- Arrays --

#[test]
fn arrays_are_zeroed_and_indexable() {
    let out = run_main(
        "function main(): void {
            var a: int[] = array [5] of int;
            var i: int;
            for (i, 0, len(a), 1) { a[i] = i * i; }
            writeln(a[4] + a[3]);
            var f: float[] = array [2] of float;
            writeln(f[1]);
            var s: string[] = array [1] of string;
            writeln(s[0]);
        }",
    );
    assert_eq!(out, "25\n0.0\nnull\n");
}

#[test]
fn arrays_are_passed_by_reference() {
    let out = run_main(
        "function fill(a: int[], v: int): void { a[0] = v; }
         function main(): void {
            var a: int[] = array [1] of int;
            fill(a, 9);
            writeln(a[0]);
         }",
    );
    assert_eq!(out, "9\n");
}

#[test]
fn out_of_bounds_index_traps() {
    let result = run_with_input(
        "function f(): int { var a: int[] = array [2] of int; return a[2]; }",
        "f",
        "()I",
        vec![],
        "",
    );
    assert_eq!(result, Err(Trap::ArrayIndexOutOfBounds(2)));
}

#[test]
fn negative_array_size_traps() {
    let result = run_with_input(
        "function f(n: int): int[] { return array [n] of int; }",
        "f",
        "(I)[I",
        vec![Value::Int(-1)],
        "",
    );
    assert_eq!(result, Err(Trap::NegativeArraySize(-1)));
}

// -- Strings --

#[test]
fn string_concatenation_and_equality() {
    let out = run_main(
        "function main(): void {
            var a: string = \"ab\";
            var b: string = a + \"c\";
            writeln(b);
            writeln(b == \"abc\");
            writeln(b != \"abc\");
            writeln(len(b));
        }",
    );
    assert_eq!(out, "abc\ntrue\nfalse\n3\n");
}

#[test]
fn comparing_an_unset_string_traps() {
    let result = run_with_input(
        "var s: string;
         function main(): void { writeln(s == \"a\"); }",
        "main",
        "()V",
        vec![],
        "",
    );
    assert_eq!(result, Err(Trap::NullPointer));
}

// -- Records --

#[test]
fn records_are_shared_by_reference() {
    let out = run_main(
        "record Point { x: int; y: float; }
         function shift(p: Point, dx: int): void { p.x = p.x + dx; }
         function main(): void {
            var p: Point = Point(1, 2.5);
            var q: Point = p;
            shift(q, 4);
            writeln(p.x);
            writeln(p.y);
            writeln(p == q);
            writeln(p == Point(5, 2.5));
         }",
    );
    assert_eq!(out, "5\n2.5\ntrue\nfalse\n");
}

#[test]
fn printing_a_record_renders_every_field() {
    let out = run_main(
        "record Point { x: int; y: float; }
         record Path { name: string; points: Point[]; steps: int[]; closed: bool; }
         function main(): void {
            var pts: Point[] = array [2] of Point;
            pts[0] = Point(1, 2);
            var steps: int[] = array [3] of int;
            steps[2] = 7;
            writeln(pts[0]);
            writeln(Path(\"a\", pts, steps, false));
         }",
    );
    assert_eq!(
        out,
        "Point {x= 1, y= 2.0}\n\
         Path {name= a, points= [Point {x= 1, y= 2.0}, null], steps= [0, 0, 7], closed= false}\n"
    );
}

#[test]
fn records_link_into_lists() {
    let out = run_main(
        "record Node { value: int; next: Node; }
         function main(): void {
            var none: Node;
            var list: Node = none;
            var i: int;
            for (i, 1, 5, 1) { list = Node(i, list); }
            var total: int = 0;
            var n: Node = list;
            while (n != none) { total = total + n.value; n = n.next; }
            writeln(total);
            list.next.next.value = 100;
            writeln(list.next.next);
         }",
    );
    assert_eq!(out, "10\nNode {value= 100, next= Node {value= 1, next= null}}\n");
}

#[test]
fn global_records_are_built_before_main() {
    let out = run_main(
        "record Counter { hits: int; }
         var counter: Counter = Counter(10);
         function hit(): void { counter.hits = counter.hits + 1; }
         function main(): void { hit(); hit(); writeln(counter.hits); }",
    );
    assert_eq!(out, "12\n");
}

#[test]
fn field_of_an_unset_record_traps() {
    let result = run_with_input(
        "record Box { size: int; inner: Box; }
         function main(): void { var b: Box = Box(1, b0()); b.inner.size = 3; }
         function b0(): Box { var none: Box; return none; }",
        "main",
        "()V",
        vec![],
        "",
    );
    assert_eq!(result, Err(Trap::NullPointer));
}

#[test]
fn escapes_reach_the_output() {
    let out = run_main("function main(): void { write(\"a\\tb\\n\\\"c\\\"\\\\\"); }");
    assert_eq!(out, "a\tb\n\"c\"\\");
}

#[test]
fn non_ascii_text_round_trips() {
    let out = run_main(
        "function main(): void { var s: string = \"h\u{e9}llo \u{1F600}\"; writeln(s); writeln(len(\"h\u{e9}llo\")); }",
    );
    assert_eq!(out, "h\u{e9}llo \u{1F600}\n5\n");
}

// -- Builtins --

#[test]
fn floor_and_chr() {
    let out = run_main(
        "function main(): void {
            writeln(floor(2.7));
            writeln(floor(-1.5));
            writeln(chr(65) + chr(98));
        }",
    );
    assert_eq!(out, "2\n-2\nAb\n");
}

#[test]
fn typed_writers_do_not_end_the_line() {
    let out = run_main(
        "function main(): void { writeInt(4); writeFloat(2); write(true); writeln(); }",
    );
    assert_eq!(out, "42.0true\n");
}

#[test]
fn floats_print_like_java() {
    let out = run_main(
        "function main(): void {
            writeln(1.5);
            writeln(10.0 / 4);
            writeln(100000000.0);
            writeln(0.0001);
            writeln(-0.5);
        }",
    );
    assert_eq!(out, "1.5\n2.5\n1.0E8\n1.0E-4\n-0.5\n");
}

#[test]
fn reading_input() {
    let out = run_main_with_input(
        "function main(): void {
            var a: int = readInt();
            var b: float = readFloat();
            var name: string = readString();
            writeln(name + \": \");
            writeln(a + b);
        }",
        "3 0.5 total",
    );
    assert_eq!(out, "total: \n3.5\n");
}

#[test]
fn reading_past_the_end_of_input_traps() {
    let result = run_with_input(
        "function f(): int { return readInt(); }",
        "f",
        "()I",
        vec![],
        "",
    );
    assert_eq!(result, Err(Trap::NoSuchElement));
}

// -- Globals --

#[test]
fn globals_are_initialized_before_main() {
    let out = run_main(
        "var count: int = 2;
         const GREETING: string = \"hi\";
         var ratio: float = count * 1.5;
         var unset: int;
         function main(): void {
            count = count + 1;
            writeln(GREETING);
            writeln(count);
            writeln(ratio);
            writeln(unset);
         }",
    );
    assert_eq!(out, "hi\n3\n3.0\n0\n");
}

#[test]
fn locals_without_initializer_start_at_default() {
    let out = run_main(
        "function main(): void {
            var i: int;
            var f: float;
            var b: bool;
            writeln(i);
            writeln(f);
            writeln(b);
        }",
    );
    assert_eq!(out, "0\n0.0\nfalse\n");
}
