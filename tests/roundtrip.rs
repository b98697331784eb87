//! Write side against read side: compile a call, run it on the CPU print
//! buffer the way the generated GLSL runs on the device, decode.

use shaderprintf::{
    PrintfConfig,
    cpu::{HostPrintBuffer, Value, encode_record},
    decode::{decode_buffer, decode_payload},
    format::{EmitOp, FormatProgram, compile_call},
    lexer::{CallSites, Call, extract_call, find_call, strip_comments},
    rewrite::add_printf_to_source,
};

fn compile(src: &str) -> (Call, FormatProgram) {
    let at = find_call(src, "printf").expect("call site");
    let call = extract_call(src, at).expect("extract");
    let program = compile_call(src, &call).expect("compile");
    (call, program)
}

#[test]
fn text_and_one_integer() {
    let (_, p) = compile(r#"printf("text %d end", 7);"#);
    let record = encode_record(&p, &[Value::Int(7)]).unwrap();
    assert_eq!(
        decode_payload(record.len() as u32 + 1, &record, record.len() + 1),
        "text 7 end"
    );
}

#[test]
fn comment_and_string_occurrences_are_skipped() {
    let src = r#"
        // printf("in a line comment");
        /* printf("in a block comment"); */
        const char* s = "printf(";
        printf("real %d", 1);
    "#;
    let sites: Vec<usize> = CallSites::new(src, "printf").collect();
    assert_eq!(sites, vec![src.find("printf(\"real").unwrap()]);
    assert_eq!(find_call(src, "printf"), sites.first().copied());
}

#[test]
fn nested_calls_stay_one_argument() {
    let (call, p) = compile("printf(\"%d\", f(a, g(b,c)));");
    assert_eq!(call.value_args(), &["f(a,g(b,c))".to_string()]);
    assert_eq!(p.args_consumed, 1);
}

#[test]
fn vec3_renders_each_component() {
    let (_, p) = compile(r#"printf("v=%^3f", someVec3);"#);
    assert_eq!(p.fields().count(), 3);
    let buf = HostPrintBuffer::new(64);
    buf.execute(
        &p,
        &[Value::Vector(vec![
            Value::Float(1.5),
            Value::Float(-2.0),
            Value::Float(0.125),
        ])],
    )
    .unwrap();
    assert_eq!(buf.read_string(), "v=(1.500000, -2.000000, 0.125000)");
}

#[test]
fn second_record_is_dropped_when_it_does_not_fit() {
    let (_, p) = compile(r#"printf("ab\n");"#);
    assert_eq!(p.write_size(), 3);
    let buf = HostPrintBuffer::new(4);
    assert!(buf.execute(&p, &[]).unwrap());
    assert!(!buf.execute(&p, &[]).unwrap());
    let words = buf.snapshot();
    assert_eq!(words, vec![7, 'a' as u32, 'b' as u32, '\n' as u32]);
    let report = decode_buffer(&words);
    assert_eq!(report.text, "ab\n");
    assert!(report.overflowed);
}

#[test]
fn escaped_tab_is_one_literal() {
    let (_, p) = compile(r#"printf("a\tb");"#);
    assert_eq!(
        p.ops,
        vec![
            EmitOp::Literal('a' as u32),
            EmitOp::Literal('\t' as u32),
            EmitOp::Literal('b' as u32),
        ]
    );
}

#[test]
fn source_without_calls_only_gains_the_header() {
    let src = "#version 450\nlayout(local_size_x = 1) in;\nvoid main() {\n  int print = 1;\n}\n";
    let out = add_printf_to_source(src, &PrintfConfig::default()).unwrap();
    let (head, tail) = src.split_at(src.find('\n').unwrap());
    assert!(out.starts_with(head));
    assert!(out.ends_with(tail));
    let inserted = &out[head.len()..out.len() - tail.len()];
    assert!(inserted.starts_with("\nlayout(std430) buffer printBuffer{uint printData[];};"));
    assert!(inserted.ends_with("\n#line 2"));
}

#[test]
fn line_numbers_survive_rewrite() {
    let src = "#version 450\n/* two\nlines */\nvoid main() {\n  printf(\"%d %d\\n\",\n         a,\n         b);\n  marker();\n}\n";
    let out = add_printf_to_source(src, &PrintfConfig::default()).unwrap();
    let body = out.split_once("#line 2\n").unwrap().1;
    let line_of = |text: &str, needle: &str| {
        text[..text.find(needle).unwrap()].matches('\n').count()
    };
    assert_eq!(line_of(body, "marker"), line_of(src, "marker") - 1);
}

#[test]
fn many_threads_one_buffer() {
    let (_, p) = compile(r#"printf("[%u:%x]", id, id);"#);
    let n = 500u32;
    let inv: Vec<Vec<Value>> = (0..n).map(|i| vec![Value::Uint(i), Value::Uint(i)]).collect();
    let buf = HostPrintBuffer::new(1 + p.write_size() * n as usize);
    assert_eq!(buf.dispatch(&p, &inv).unwrap(), n as usize);
    let text = buf.read_string();
    let mut ids: Vec<u32> = text
        .split_terminator(']')
        .map(|rec| {
            let (dec, hex) = rec.trim_start_matches('[').split_once(':').unwrap();
            let d: u32 = dec.parse().unwrap();
            assert_eq!(u32::from_str_radix(hex, 16).unwrap(), d);
            d
        })
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..n).collect::<Vec<_>>());
}

#[test]
fn rewritten_calls_compile_from_scrubbed_source() {
    let src = "void main(){ printf(\"%d\", i); /* printf(\"x\"); */ }";
    let scrubbed = strip_comments(src);
    assert_eq!(CallSites::new(&scrubbed, "printf").count(), 1);
    let out = add_printf_to_source(src, &PrintfConfig::default()).unwrap();
    assert_eq!(out.matches("atomicAdd").count(), 1);
}
