use std::env;
use std::f64::consts::PI;
use std::fs;
use std::path::PathBuf;

/// Fractional bits of the Q16.16 table entries
const FRAC_BITS: i32 = 16;

/// Entries covering [0, pi] for sine/cosine, [0, 1] for atan/asin
const HALF_TABLE_LEN: usize = 257;

/// Entries covering [1, 4] for the square root
const SQRT_TABLE_LEN: usize = 769;

fn to_raw(value: f64) -> i32 {
    (value * f64::from(1 << FRAC_BITS)).round() as i32
}

fn emit_table(out: &mut String, name: &str, doc: &str, values: &[i32]) {
    out.push_str(&format!("/// {}\n", doc));
    out.push_str(&format!(
        "pub(crate) static {}: [i32; {}] = [\n",
        name,
        values.len()
    ));
    for chunk in values.chunks(8) {
        out.push_str("    ");
        let line: Vec<String> = chunk.iter().map(|v| v.to_string()).collect();
        out.push_str(&line.join(", "));
        out.push_str(",\n");
    }
    out.push_str("];\n\n");
}

fn generate_tables() -> String {
    let step = |i: usize| i as f64 / 256.0;

    let sin: Vec<i32> = (0..HALF_TABLE_LEN)
        .map(|i| to_raw((step(i) * PI).sin()))
        .collect();
    let cos: Vec<i32> = (0..HALF_TABLE_LEN)
        .map(|i| to_raw((step(i) * PI).cos()))
        .collect();
    let atan: Vec<i32> = (0..HALF_TABLE_LEN)
        .map(|i| to_raw(step(i).atan()))
        .collect();
    let asin: Vec<i32> = (0..HALF_TABLE_LEN)
        .map(|i| to_raw(step(i).asin()))
        .collect();
    let sqrt: Vec<i32> = (0..SQRT_TABLE_LEN)
        .map(|i| to_raw(((i + 256) as f64 / 256.0).sqrt()))
        .collect();

    let mut out = String::new();
    out.push_str("// Generated by build.rs. Do not edit.\n\n");
    emit_table(&mut out, "SIN_TABLE", "sin(i * pi / 256), i = 0..=256", &sin);
    emit_table(&mut out, "COS_TABLE", "cos(i * pi / 256), i = 0..=256", &cos);
    emit_table(&mut out, "ATAN_TABLE", "atan(i / 256), i = 0..=256", &atan);
    emit_table(&mut out, "ASIN_TABLE", "asin(i / 256), i = 0..=256", &asin);
    emit_table(
        &mut out,
        "SQRT_TABLE",
        "sqrt((i + 256) / 256), i = 0..=768",
        &sqrt,
    );
    out
}

fn main() {
    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => panic!("OUT_DIR not set"),
    };
    let dest = out_dir.join("trig_tables.rs");
    if let Err(e) = fs::write(&dest, generate_tables()) {
        panic!("failed to write {}: {}", dest.display(), e);
    }
    println!("cargo:rerun-if-changed=build.rs");
}
