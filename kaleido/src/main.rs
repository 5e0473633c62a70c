use kaleido_parser::lexer::tokenize;
use kaleido_parser::parser::Parser;
use kaleido_source::Source;
use std::path::{Path, PathBuf};
use std::{env, fs, process};

const USAGE: &str = "usage: kaleido <input> [-o <output>] [--tokens] [--ast]";

struct Options {
    input: PathBuf,
    output: Option<PathBuf>,
    dump_tokens: bool,
    dump_ast: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut input = None;
    let mut output = None;
    let mut dump_tokens = false;
    let mut dump_ast = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" => match args.next() {
                Some(path) => output = Some(PathBuf::from(path)),
                None => return Err("`-o` needs a path".to_string()),
            },
            "--tokens" => dump_tokens = true,
            "--ast" => dump_ast = true,
            other if other.starts_with('-') => {
                return Err(format!("unknown option `{}`", other));
            }
            _ => {
                if input.replace(PathBuf::from(arg)).is_some() {
                    return Err("more than one input file".to_string());
                }
            }
        }
    }

    Ok(Options {
        input: input.ok_or_else(|| "no input file".to_string())?,
        output,
        dump_tokens,
        dump_ast,
    })
}

/// Default output path: the input with an `.s` extension.
fn output_path(input: &Path) -> PathBuf {
    input.with_extension("s")
}

fn run(options: &Options) -> Result<(), String> {
    let code = fs::read_to_string(&options.input)
        .map_err(|err| format!("cannot read {}: {}", options.input.display(), err))?;

    // dump modes print the intermediate form and stop
    if options.dump_tokens {
        let tokens = tokenize(&code).map_err(|err| err.to_string())?;
        for token in tokens {
            println!("{:?}", token);
        }
        return Ok(());
    }
    if options.dump_ast {
        let source: Source = code.as_str().into();
        let program = Parser::new(&source)
            .map_err(|err| err.to_string())?
            .parse_program();
        eprint!("{}", source.errors);
        if !source.has_no_errors() {
            return Err("aborting due to parse errors".to_string());
        }
        println!("{:#?}", program);
        return Ok(());
    }

    let asm = kaleido::compile(&code).map_err(|err| err.to_string())?;
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| output_path(&options.input));
    fs::write(&output, asm).map_err(|err| format!("cannot write {}: {}", output.display(), err))?;
    Ok(())
}

fn main() {
    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {}", message);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    if let Err(message) = run(&options) {
        eprintln!("error: {}", message);
        process::exit(1);
    }
}
