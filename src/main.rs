use caraway::{Expression, Value};
use clap::Parser as ClapParser;
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "caraway")]
#[command(about = "Caraway - an embeddable expression evaluator")]
#[command(version)]
struct Cli {
    /// The expression to evaluate
    expression: String,

    /// Bind a variable, e.g. --var a=3 or --var 'name="text"' (JSON values)
    #[arg(short, long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,

    /// Pretty-print the result
    #[arg(short, long)]
    pretty: bool,

    /// Only validate syntax, don't evaluate
    #[arg(long)]
    syntax_only: bool,

    /// Print the parsed syntax tree instead of evaluating
    #[arg(long)]
    dump_ast: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(message) = run(cli) {
        eprintln!("{}", message);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let expression = Expression::new(&cli.expression);

    if cli.syntax_only {
        expression.validate().map_err(|e| e.to_string())?;
        println!("Syntax is valid");
        return Ok(());
    }

    if cli.dump_ast {
        let ast = expression.ast().map_err(|e| e.to_string())?;
        let dump = if cli.pretty {
            serde_json::to_string_pretty(&ast.to_json())
        } else {
            serde_json::to_string(&ast.to_json())
        }
        .map_err(|e| e.to_string())?;
        println!("{}", dump);
        return Ok(());
    }

    let mut context = expression.context();
    for binding in &cli.vars {
        let (name, raw) = binding
            .split_once('=')
            .ok_or_else(|| format!("invalid binding '{}', expected NAME=VALUE", binding))?;
        let value = match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(json) => Value::from_json(&json),
            // unquoted text binds as a plain string
            Err(_) => Value::String(raw.to_string()),
        };
        context = context.with(name, value);
    }

    // piped JSON input is bound as `data`
    if !atty::is(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| e.to_string())?;
        if !buffer.trim().is_empty() {
            let json: serde_json::Value =
                serde_json::from_str(&buffer).map_err(|e| format!("invalid JSON input: {}", e))?;
            context = context.with("data", Value::from_json(&json));
        }
    }

    let result = expression.evaluate(&context).map_err(|e| e.to_string())?;
    let json = if cli.pretty {
        serde_json::to_string_pretty(&result.to_json())
    } else {
        serde_json::to_string(&result.to_json())
    }
    .map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}
