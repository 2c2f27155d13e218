//! Decode a CIM-XML document and print what it holds.
//!
//! Usage: cimxml-dump <file> [--kind message|declaration|class|instance|auto] [--reencode] [-v]
//!
//! With `--reencode` the decoded document is written back out as CIM-XML
//! instead of summarized, which shows how the encoder normalizes it.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use cimxml_core::message::{CimError, IValue, MessageBody};
use cimxml_core::{
    decode_class, decode_declaration, decode_instance, decode_message, encode_class,
    encode_declaration, encode_instance, encode_message, CimClass, CimInstance, CimProperty,
    Declaration, DecodeError, Message,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Decode a CIM-XML document and print a summary of it
struct Cli {
    /// Document to decode
    file: PathBuf,

    /// What the document holds
    #[arg(long, value_enum, default_value_t = Kind::Auto)]
    kind: Kind,

    /// Print the re-encoded document instead of a summary
    #[arg(long)]
    reencode: bool,

    /// Log decoder events (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Kind {
    /// Guess from the first elements
    Auto,
    /// `<CIM><MESSAGE>` request or response
    Message,
    /// `<CIM><DECLARATION>` schema document
    Declaration,
    /// Bare `CLASS` element
    Class,
    /// Bare `INSTANCE` element
    Instance,
}

enum Document {
    Message(Message),
    Declaration(Declaration),
    Class(CimClass),
    Instance(CimInstance),
}

fn create_env_filter(verbosity: u8) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbosity {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("cimxml_core=debug,cimxml_std=debug"),
            _ => EnvFilter::new("cimxml_core=trace,cimxml_std=trace"),
        }
    }
}

/// Pick a kind from the root element, skipping the XML declaration.
fn detect_kind(source: &str) -> Kind {
    let mut rest = source.trim_start();
    if rest.starts_with("<?xml") {
        rest = rest.find("?>").map_or("", |i| rest[i + 2..].trim_start());
    }
    if rest.starts_with("<CIM") {
        if rest.contains("<DECLARATION") {
            Kind::Declaration
        } else {
            Kind::Message
        }
    } else if rest.starts_with("<CLASS") {
        Kind::Class
    } else {
        Kind::Instance
    }
}

fn decode(source: &str, kind: Kind) -> Result<Document, DecodeError> {
    let kind = match kind {
        Kind::Auto => detect_kind(source),
        other => other,
    };
    tracing::debug!(?kind, len = source.len(), "decoding");
    Ok(match kind {
        Kind::Message | Kind::Auto => Document::Message(decode_message(source)?),
        Kind::Declaration => Document::Declaration(decode_declaration(source)?),
        Kind::Class => Document::Class(decode_class(source)?),
        Kind::Instance => Document::Instance(decode_instance(source)?),
    })
}

// === Summaries ===

fn print_property(indent: &str, property: &CimProperty) {
    let array = if property.is_array() { "[]" } else { "" };
    let origin = if property.propagated() {
        format!(" (from {})", property.class_origin())
    } else {
        String::new()
    };
    if property.value().is_null() {
        println!("{indent}{}: {}{array}{origin}", property.name(), property.cim_type());
    } else {
        println!(
            "{indent}{}: {}{array} = {}{origin}",
            property.name(),
            property.cim_type(),
            property.value()
        );
    }
}

fn print_class(indent: &str, class: &CimClass) {
    if class.superclass().is_null() {
        println!("{indent}class {}", class.class_name());
    } else {
        println!("{indent}class {} : {}", class.class_name(), class.superclass());
    }
    let inner = format!("{indent}  ");
    for qualifier in class.qualifiers().iter() {
        println!("{inner}[{} = {}]", qualifier.name(), qualifier.value());
    }
    for property in class.properties() {
        print_property(&inner, property);
    }
    for method in class.methods() {
        let params: Vec<_> = method
            .parameters()
            .iter()
            .map(|p| format!("{}: {}", p.name(), p.cim_type()))
            .collect();
        println!("{inner}{}({}) -> {}", method.name(), params.join(", "), method.return_type());
    }
}

fn print_instance(indent: &str, instance: &CimInstance) {
    match instance.path() {
        Some(path) => println!("{indent}instance {path}"),
        None => println!("{indent}instance of {}", instance.class_name()),
    }
    let inner = format!("{indent}  ");
    for property in instance.properties() {
        print_property(&inner, property);
    }
}

fn print_error(error: &CimError) {
    println!("  ERROR {}: {}", error.code, error.description);
    for instance in &error.instances {
        print_instance("    ", instance);
    }
}

fn print_ivalue(value: &IValue) {
    match value {
        IValue::Empty => println!("  (empty)"),
        IValue::Value(v) => println!("  {v}"),
        IValue::ClassNames(names) => names.iter().for_each(|n| println!("  {n}")),
        IValue::InstanceNames(paths) | IValue::ObjectPaths(paths) | IValue::InstancePaths(paths) => {
            paths.iter().for_each(|p| println!("  {p}"));
        }
        IValue::QualifierDecls(decls) => decls
            .iter()
            .for_each(|d| println!("  qualifier {}: {}", d.name(), d.cim_type())),
        IValue::Classes(classes) => classes.iter().for_each(|c| print_class("  ", c)),
        IValue::Instances(instances)
        | IValue::NamedInstances(instances)
        | IValue::InstancesWithPath(instances) => {
            instances.iter().for_each(|i| print_instance("  ", i));
        }
        IValue::Objects(objects)
        | IValue::ObjectsWithPath(objects)
        | IValue::ObjectsWithLocalPath(objects) => {
            for object in objects {
                if let Some(class) = object.as_class() {
                    print_class("  ", class);
                } else if let Some(instance) = object.as_instance() {
                    print_instance("  ", instance);
                }
            }
        }
    }
}

fn print_message(message: &Message) {
    let kind = match &message.body {
        MessageBody::MethodCall(_) => "METHODCALL",
        MessageBody::IMethodCall(_) => "IMETHODCALL",
        MessageBody::ExportMethodCall(_) => "EXPMETHODCALL",
        MessageBody::MethodResponse(_) => "METHODRESPONSE",
        MessageBody::IMethodResponse(_) => "IMETHODRESPONSE",
        MessageBody::ExportMethodResponse(_) => "EXPMETHODRESPONSE",
    };
    println!(
        "MESSAGE {} (protocol {}): {kind} {}",
        message.id,
        message.protocol_version,
        message.method_name()
    );

    match &message.body {
        MessageBody::MethodCall(call) => {
            println!("  target {}", call.path);
            for param in &call.params {
                println!("  {} = {}", param.name, param.value);
            }
        }
        MessageBody::IMethodCall(call) => {
            println!("  namespace {}", call.namespace);
            for param in &call.params {
                println!("  {}:", param.name);
                print_ivalue(&param.value);
            }
        }
        MessageBody::ExportMethodCall(call) => {
            for param in &call.params {
                match &param.instance {
                    Some(instance) => {
                        println!("  {}:", param.name);
                        print_instance("    ", instance);
                    }
                    None => println!("  {}: (empty)", param.name),
                }
            }
        }
        MessageBody::MethodResponse(response) => {
            if let Some(error) = &response.error {
                print_error(error);
            }
            if let Some(value) = &response.return_value {
                println!("  return {value}");
            }
            for param in &response.params {
                println!("  {} = {}", param.name, param.value);
            }
        }
        MessageBody::IMethodResponse(response) => {
            if let Some(error) = &response.error {
                print_error(error);
            }
            if let Some(value) = &response.return_value {
                print_ivalue(value);
            }
        }
        MessageBody::ExportMethodResponse(response) => {
            if let Some(error) = &response.error {
                print_error(error);
            }
            if let Some(value) = &response.return_value {
                print_ivalue(value);
            }
        }
    }
}

fn print_declaration(declaration: &Declaration) {
    println!(
        "DECLARATION (CIM {}, DTD {}): {} group(s)",
        declaration.cim_version,
        declaration.dtd_version,
        declaration.groups.len()
    );
    for decl in declaration.qualifier_decls() {
        println!("  qualifier {}: {}", decl.name(), decl.cim_type());
    }
    for class in declaration.classes() {
        print_class("  ", class);
    }
    for instance in declaration.instances() {
        print_instance("  ", instance);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(create_env_filter(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let source = match fs::read_to_string(&cli.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {e}", cli.file.display());
            return ExitCode::FAILURE;
        }
    };

    let document = match decode(&source, cli.kind) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{}: {e}", cli.file.display());
            return ExitCode::FAILURE;
        }
    };

    if cli.reencode {
        let out = match &document {
            Document::Message(m) => encode_message(m),
            Document::Declaration(d) => encode_declaration(d),
            Document::Class(c) => encode_class(c),
            Document::Instance(i) => encode_instance(i),
        };
        print!("{out}");
    } else {
        match &document {
            Document::Message(m) => print_message(m),
            Document::Declaration(d) => print_declaration(d),
            Document::Class(c) => print_class("", c),
            Document::Instance(i) => print_instance("", i),
        }
    }
    ExitCode::SUCCESS
}
