//! Structure of emitted class files.

use pretty_assertions::assert_eq;
use quill_jvm::class_file::access;
use quillc::{CompileOptions, SourceUnit, TargetVersion};

use crate::common::class_reader::Constant;
use crate::common::{compile_all, compile_ok, compile_with, Class, Vm};

fn compile_opts(source: &str, options: &CompileOptions) -> Class {
    let out = compile_with(source, options);
    let artifact = out.artifact.expect("compiles");
    Class::parse(&artifact.bytes).expect("well-formed class")
}

#[test]
fn class_header() {
    let class = compile_ok("function f(): void { }");
    assert_eq!((class.major, class.minor), (49, 0));
    assert_eq!(class.name, "Test");
    assert_eq!(class.super_name, "java/lang/Object");
    assert_eq!(class.access, access::PUBLIC | access::SUPER);
    assert!(class.method("<init>", "()V").is_some());
}

#[test]
fn target_version_sets_the_major_version() {
    let options = CompileOptions {
        target_version: TargetVersion::Java6,
        ..CompileOptions::default()
    };
    let class = compile_opts("function f(): void { }", &options);
    assert_eq!(class.major, 50);
}

#[test]
fn class_name_follows_the_file_name_unless_given() {
    let out = quillc::compile(
        &SourceUnit::new("dir/hello-world.ql", "function f(): void { }"),
        &CompileOptions::default(),
    );
    let artifact = out.artifact.expect("compiles");
    assert_eq!(artifact.class_name, "hello_world");
    assert_eq!(Class::parse(&artifact.bytes).unwrap().name, "hello_world");

    let options = CompileOptions {
        class_name: Some("demo/Hello".to_owned()),
        ..CompileOptions::default()
    };
    assert_eq!(compile_opts("function f(): void { }", &options).name, "demo/Hello");
}

#[test]
fn invalid_class_name_is_a_diagnostic() {
    let options = CompileOptions {
        class_name: Some("not.valid".to_owned()),
        ..CompileOptions::default()
    };
    let out = compile_with("function f(): void { }", &options);
    assert!(out.artifact.is_none());
    assert_eq!(out.error_count(), 1);
}

#[test]
fn functions_become_public_static_methods() {
    let class = compile_ok(
        "function add(a: int, b: float): float { return a + b; }
         function names(n: int): string[] { return array [n] of string; }
         function show(s: string, flags: bool[]): void { }",
    );
    for (name, descriptor) in [
        ("add", "(IF)F"),
        ("names", "(I)[Ljava/lang/String;"),
        ("show", "(Ljava/lang/String;[Z)V"),
    ] {
        let method = class
            .method(name, descriptor)
            .unwrap_or_else(|| panic!("missing {name}{descriptor}"));
        assert_eq!(method.access, access::PUBLIC | access::STATIC);
    }
}

#[test]
fn max_locals_counts_parameters_and_locals() {
    let class = compile_ok("function add(a: int, b: int): int { return a + b; }");
    // Two parameters plus the temporary holding `a + b`.
    assert_eq!(class.method("add", "(II)I").unwrap().max_locals, 3);

    let class = compile_ok(
        "function f(a: int): int { var b: int = a * 2; { var c: int = b; b = c + 1; } return b; }",
    );
    assert!(class.method("f", "(I)I").unwrap().max_locals >= 3);
}

#[test]
fn main_gets_a_java_entry_point() {
    let class = compile_ok("function main(): void { writeln(\"hi\"); }");
    let bridge = class.method("main", "([Ljava/lang/String;)V").unwrap();
    assert_eq!(bridge.access, access::PUBLIC | access::STATIC);
    assert!(class.method("main", "()V").is_some());

    // Only a parameterless void main is bridged.
    let class = compile_ok("function main(): int { return 0; }");
    assert!(class.method("main", "([Ljava/lang/String;)V").is_none());
}

#[test]
fn identical_constants_share_one_pool_entry() {
    let class = compile_ok(
        "function f(): void {
            writeln(\"hi\"); writeln(\"hi\");
            writeln(100000); writeln(100000);
            writeln(2.5); writeln(2.5);
         }",
    );
    assert_eq!(
        class.count_constants(|c| matches!(c, Constant::Utf8(s) if s == "hi")),
        1
    );
    assert_eq!(class.count_constants(|c| matches!(c, Constant::String(_))), 1);
    assert_eq!(
        class.count_constants(|c| *c == Constant::Integer(100_000)),
        1
    );
    assert_eq!(class.count_constants(|c| *c == Constant::Float(2.5)), 1);

    let mut refs: Vec<_> = (0..class.constants.len())
        .filter_map(|i| class.member_ref(u16::try_from(i).unwrap()).ok())
        .collect();
    let total = refs.len();
    refs.sort_unstable();
    refs.dedup();
    assert_eq!(refs.len(), total, "member references are not shared");
}

#[test]
fn small_ints_do_not_use_the_pool() {
    let class = compile_ok("function f(): int { return 5 + 100 + 30000 - 1; }");
    assert_eq!(class.count_constants(|c| matches!(c, Constant::Integer(_))), 0);
}

#[test]
fn max_stack_matches_the_deepest_point_reached() {
    let class = compile_ok(
        "var total: float = 0.5 * 4;
         function mix(a: int, b: float): float {
            return (a * 2 + 1) * (b - a / 3) + floor(b) * a;
         }
         function main(): void {
            var a: int[] = array [3] of int;
            a[1 + 1] = a[0] + len(\"ab\") * 3;
            writeln(mix(7, 2.5) + total);
            writeln(\"x\" + \"y\" + chr(65 + a[2]));
         }",
    );
    let mut vm = Vm::new(std::slice::from_ref(&class), "").unwrap();
    vm.invoke("main", "()V", Vec::new()).unwrap();
    assert_eq!(vm.stdout, "23.5\nxyG\n");

    // Every instruction of these methods runs, so the deepest point seen
    // is the deepest point there is.
    assert_eq!(vm.peak_stack.len(), 3);
    for (key, peak) in &vm.peak_stack {
        let method = class
            .methods
            .iter()
            .find(|m| format!("{}{}", m.name, m.descriptor) == *key)
            .unwrap();
        assert_eq!(usize::from(method.max_stack), *peak, "max_stack of {key}");
    }
}

#[test]
fn max_stack_is_never_exceeded_on_branching_code() {
    let class = compile_ok(
        "function pick(n: int): float {
            if (n > 2 && n < 10 || n == 0) { return n * 1.5; }
            while (n > 0) { n = n - 1; }
            return 0.0;
         }",
    );
    let mut vm = Vm::new(std::slice::from_ref(&class), "").unwrap();
    for n in [0, 1, 5, 12] {
        vm.invoke("pick", "(I)F", vec![crate::common::Value::Int(n)])
            .unwrap();
    }
    let method = class.method("pick", "(I)F").unwrap();
    assert!(vm.peak_stack["pick(I)F"] <= usize::from(method.max_stack));
}

#[test]
fn records_are_separate_public_classes() {
    let classes = compile_all(
        "record Point { x: int; y: float; }
         function origin(): Point { return Point(0, 0); }",
    );
    let names: Vec<_> = classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Test", "Point"]);
    assert!(classes[0].method("origin", "()LPoint;").is_some());

    let point = &classes[1];
    assert_eq!((point.major, point.super_name.as_str()), (49, "java/lang/Object"));
    assert_eq!(point.access, access::PUBLIC | access::SUPER);
    let fields: Vec<_> = point
        .fields
        .iter()
        .map(|f| (f.access, f.name.as_str(), f.descriptor.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![(access::PUBLIC, "x", "I"), (access::PUBLIC, "y", "F")]
    );
    assert_eq!(point.method("<init>", "(IF)V").unwrap().max_locals, 3);
    assert!(point.method("toString", "()Ljava/lang/String;").is_some());
}

#[test]
fn record_methods_declare_exact_max_stack() {
    let classes = compile_all(
        "record Pair { x: int; y: float; name: string; flags: bool[]; }
         function main(): void { writeln(Pair(1, 2, \"n\", array [2] of bool)); }",
    );
    let mut vm = Vm::new(&classes, "").unwrap();
    vm.invoke("main", "()V", Vec::new()).unwrap();
    assert_eq!(vm.stdout, "Pair {x= 1, y= 2.0, name= n, flags= [false, false]}\n");

    let pair = &classes[1];
    for method in &pair.methods {
        let key = format!("Pair.{}{}", method.name, method.descriptor);
        assert_eq!(
            vm.peak_stack.get(&key).copied(),
            Some(usize::from(method.max_stack)),
            "max_stack of {key}"
        );
    }
}

#[test]
fn debug_info_is_opt_in() {
    let source = "function f(): int {\n  var x: int = 1;\n  return x;\n}";
    let plain = compile_ok(source);
    assert_eq!(plain.source_file, None);
    assert!(plain.method("f", "()I").unwrap().line_numbers.is_empty());

    let options = CompileOptions {
        emit_debug_info: true,
        ..CompileOptions::default()
    };
    let class = compile_opts(source, &options);
    assert_eq!(class.source_file.as_deref(), Some("Test.ql"));
    let lines: Vec<u16> = class
        .method("f", "()I")
        .unwrap()
        .line_numbers
        .iter()
        .map(|&(_, line)| line)
        .collect();
    assert_eq!(lines, vec![2, 3]);
}

#[test]
fn scanner_field_only_when_input_is_read() {
    assert!(compile_ok("function f(): void { }").field("$scanner").is_none());
    let class = compile_ok("function f(): string { return readString(); }");
    let scanner = class.field("$scanner").unwrap();
    assert_eq!(scanner.descriptor, "Ljava/util/Scanner;");
    assert!(class.method("<clinit>", "()V").is_some());
}

#[test]
fn globals_are_static_fields() {
    let class = compile_ok(
        "var count: int = 2; const NAME: string = \"q\"; var grid: float[];
         function f(): void { }",
    );
    assert_eq!(class.field("count").unwrap().descriptor, "I");
    assert_eq!(class.field("grid").unwrap().descriptor, "[F");
    assert_eq!(
        class.field("NAME").unwrap().access,
        access::PUBLIC | access::STATIC | access::FINAL
    );
}
