/// Docblock Tracer - Shows how a docblock is split, tokenized and parsed
///
/// Usage: cargo run --bin trace_comment <docblock-file> [quill.toml] [context]
///
/// `context` is one of class, method, property, function (default: class).
/// Set RUST_LOG=quill_dsl=trace to see schema resolution.

use quill_core::{Target, Value};
use quill_dsl::lexer::tokenize;
use quill_dsl::{from_toml_str, split_description, strip_decoration, Parser, SchemaRegistry};
use std::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin trace_comment <docblock-file> [quill.toml] [context]");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --bin trace_comment docs/route.txt quill.toml method");
        std::process::exit(1);
    }

    let content = read(&args[1]);
    let registry = match args.get(2) {
        Some(path) => {
            let config = from_toml_str(&read(path)).unwrap_or_else(|e| fail(e));
            config.build_registry().unwrap_or_else(|e| fail(e))
        }
        None => SchemaRegistry::new(),
    };
    let context: Target = args
        .get(3)
        .map(|name| name.parse().unwrap_or_else(|e| fail(e)))
        .unwrap_or(Target::CLASS);

    println!("╔═══════════════════════════════════════════════════════════════");
    println!("║ DOCBLOCK TRACER ({})", context);
    println!("╚═══════════════════════════════════════════════════════════════\n");

    let text = strip_decoration(&content);
    let (description, tags) = split_description(&text);
    println!("📝 DESCRIPTION:");
    println!("{}\n", description);

    println!("🔍 TOKENS:");
    println!("─────────────────────────────────────────────────────────────");
    for token in tokenize(tags) {
        println!(
            "  {:>3}:{:<3} {}",
            token.span.line, token.span.column, token.kind
        );
    }
    println!();

    println!("📦 COMMENT:");
    println!("─────────────────────────────────────────────────────────────");
    match Parser::new(&registry).parse(&content, context) {
        Ok(comment) => {
            for (name, value) in comment.tags() {
                println!("  @{} = {}", name, render(value));
            }
            for (type_id, instances) in comment.annotations() {
                for instance in instances {
                    println!("  {} => {:?}", type_id, instance.object());
                }
            }
            println!("\n✅ Parsed");
        }
        Err(e) => {
            println!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

fn read(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| fail(format!("Failed to read {}: {}", path, e)))
}

fn fail(error: impl std::fmt::Display) -> ! {
    eprintln!("❌ {}", error);
    std::process::exit(1);
}

fn render(value: &Value) -> String {
    match value {
        Value::Flag => "(flag)".to_string(),
        Value::Scalar(scalar) => scalar.to_string(),
        Value::List(list) => {
            let entries: Vec<String> = list
                .iter()
                .map(|entry| match &entry.key {
                    Some(key) => format!("{}: {}", key, render(&entry.value)),
                    None => render(&entry.value),
                })
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Instance(instance) => format!("@{}", instance.type_id()),
    }
}
