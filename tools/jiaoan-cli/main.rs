use clap::{Parser, Subcommand};
use jiaoan::docx::{self, check_upload};
use jiaoan::prelude::*;
use jiaoan::template::{CompiledTemplate, Location, TemplateSource};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Validate teaching-design payloads and render them into Word templates
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a payload (or a raw model response) against the schema
    Validate {
        /// Path to the JSON payload or model response
        payload: PathBuf,
    },
    /// Validate a payload and render it into a template
    Render {
        /// Path to the JSON payload or model response
        payload: PathBuf,
        /// Template document; the built-in template is used when omitted
        #[arg(short, long, conflicts_with = "compiled")]
        template: Option<PathBuf>,
        /// Pre-compiled template artifact produced by `compile`
        #[arg(short, long)]
        compiled: Option<String>,
        /// Output file; a unique name under `outputs/` when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Fail on placeholders that have no value
        #[arg(long)]
        strict: bool,
    },
    /// List the placeholders and repeated rows of a template
    Inspect {
        template: PathBuf,
        /// Also check placeholder names and the field bindings
        #[arg(long)]
        lint: bool,
    },
    /// Write the built-in teaching-design template
    InitTemplate {
        #[arg(default_value = "templates/teaching_design.docx")]
        output: PathBuf,
    },
    /// Print the generation prompt for an uploaded document
    Prompt {
        /// The uploaded `.docx` with the source material
        material: PathBuf,
        /// Template whose text is shown to the model; the built-in one when omitted
        #[arg(short, long)]
        template: Option<PathBuf>,
    },
    /// Print the text (and optionally the tables) of a `.docx`
    ExtractText {
        document: PathBuf,
        #[arg(long)]
        tables: bool,
    },
    /// Parse a template once and store it as a bincode artifact
    Compile { template: PathBuf, output: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { payload } => run_validate(payload),
        Command::Render {
            payload,
            template,
            compiled,
            output,
            strict,
        } => run_render(payload, template, compiled, output, strict),
        Command::Inspect { template, lint } => run_inspect(template, lint),
        Command::InitTemplate { output } => run_init_template(output),
        Command::Prompt { material, template } => run_prompt(material, template),
        Command::ExtractText { document, tables } => run_extract_text(document, tables),
        Command::Compile { template, output } => run_compile(template, output),
    }
}

fn read_text(path: &PathBuf) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read '{}': {}", path.display(), e))
    })
}

fn read_bytes(path: &PathBuf) -> Vec<u8> {
    fs::read(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read '{}': {}", path.display(), e))
    })
}

fn load_data(path: &PathBuf) -> TeachingDesignData {
    match TeachingDesignData::from_json_str(&read_text(path)) {
        Ok(data) => data,
        Err(GenerateError::Invalid(errors)) => {
            eprintln!("\nPayload is invalid ({} problem(s)):", errors.len());
            for error in &errors {
                eprintln!("  - {}", error);
            }
            std::process::exit(2);
        }
        Err(e) => exit_with_error(&e.to_string()),
    }
}

fn run_validate(payload: PathBuf) {
    let start = Instant::now();
    let data = load_data(&payload);
    println!("Payload is valid ({:?}).", start.elapsed());
    println!("  -> Lesson: {} ({})", data.lesson_name(), data.subject());
    println!("  -> Learning activities: {}", data.learning_activities().len());
    println!(
        "  -> Thinking-training points: {}",
        data.reflection_thinking_points().len()
    );
}

fn run_render(
    payload: PathBuf,
    template: Option<PathBuf>,
    compiled: Option<String>,
    output: Option<PathBuf>,
    strict: bool,
) {
    let total_start = Instant::now();

    // --- 1. Validation ---
    let validate_start = Instant::now();
    let data = load_data(&payload);
    let validate_duration = validate_start.elapsed();

    // --- 2. Template Loading ---
    let load_start = Instant::now();
    let source: TemplateSource = match (template, compiled) {
        (Some(path), _) => path.into(),
        (None, Some(artifact)) => CompiledTemplate::from_file(&artifact)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()))
            .into(),
        (None, None) => default_template()
            .unwrap_or_else(|e| exit_with_error(&e.to_string()))
            .into(),
    };
    let processor = TemplateProcessor::builder(source)
        .strict(strict)
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Template could not be loaded: {}", e)));
    let load_duration = load_start.elapsed();

    let check = processor.check_bindings();
    if check.legacy_activity_intent {
        println!("Warning: template still uses a document-level {{{{ activity_intent }}}} placeholder.");
    }

    // --- 3. Rendering ---
    let render_start = Instant::now();
    let document = processor
        .render(&data)
        .unwrap_or_else(|e| exit_with_error(&format!("Rendering failed: {}", e)));
    let render_duration = render_start.elapsed();

    // --- 4. Writing ---
    let output = output
        .unwrap_or_else(|| PathBuf::from("outputs").join(unique_output_name(data.lesson_name())));
    document
        .write_to(&output)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    println!("\nRendered '{}' -> {}", data.lesson_name(), output.display());
    for region in &document.report().rows {
        println!("  -> {}: {} row(s)", region.list, region.count);
    }
    for warning in &document.report().warnings {
        println!("  -> Note: {}", warning);
    }

    println!("\n--- Performance Summary ---");
    println!("Validation:       {:?}", validate_duration);
    println!("Template Loading: {:?}", load_duration);
    println!("Rendering:        {:?}", render_duration);
    println!("-------------------------");
    println!("Total Execution:  {:?}", total_start.elapsed());
}

fn run_inspect(template: PathBuf, lint: bool) {
    let processor = TemplateProcessor::open(&template)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let info = processor.info();

    println!("Template: {}", template.display());
    println!(
        "  Paragraphs: {}, tables: {}",
        info.paragraph_count, info.table_count
    );
    println!("\nPlaceholders:");
    for placeholder in &info.placeholders {
        let location = match &placeholder.location {
            Location::LoopRow { .. } => format!("{} [row]", placeholder.location),
            other => other.to_string(),
        };
        println!("  {{{{ {} }}}}  {} ({})", placeholder.name, location, placeholder.part);
    }
    println!("\nRepeated rows:");
    for region in &info.regions {
        println!(
            "  {} as '{}' in table {} row {}: {}",
            region.list,
            region.var,
            region.table + 1,
            region.row + 1,
            region.fields.join(", ")
        );
    }

    if lint {
        let report = info.lint();
        let check = processor.check_bindings();
        println!("\nLint:");
        for error in &report.errors {
            println!("  error: {}", error);
        }
        for warning in &report.warnings {
            println!("  warning: {}", warning);
        }
        for name in &check.unbound {
            println!("  warning: '{}' is not bound to any payload field", name);
        }
        for name in &check.unused {
            println!("  note: payload field '{}' is not shown by the template", name);
        }
        if check.legacy_activity_intent {
            println!("  error: document-level {{{{ activity_intent }}}} must move into the activity row");
        }
        if !report.is_ok() || check.legacy_activity_intent {
            std::process::exit(1);
        }
    }
}

fn run_init_template(output: PathBuf) {
    let bytes = default_template().unwrap_or_else(|e| exit_with_error(&e.to_string()));
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).unwrap_or_else(|e| exit_with_error(&e.to_string()));
    }
    fs::write(&output, bytes).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to write '{}': {}", output.display(), e))
    });
    println!("Template written to {}", output.display());
}

fn run_prompt(material: PathBuf, template: Option<PathBuf>) {
    let check = check_upload(&material).unwrap_or_else(|e| exit_with_error(&e.to_string()));
    for warning in &check.warnings {
        eprintln!("Warning: {}", warning);
    }
    let material_text = docx::extract_text(&read_bytes(&material))
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let template_bytes = match template {
        Some(path) => read_bytes(&path),
        None => default_template().unwrap_or_else(|e| exit_with_error(&e.to_string())),
    };
    let template_text =
        docx::extract_text(&template_bytes).unwrap_or_else(|e| exit_with_error(&e.to_string()));
    println!("{}", generation_prompt(&material_text, &template_text));
}

fn run_extract_text(document: PathBuf, tables: bool) {
    let bytes = read_bytes(&document);
    let text = docx::extract_text(&bytes).unwrap_or_else(|e| exit_with_error(&e.to_string()));
    println!("{}", text);
    if tables {
        let tables =
        docx::extract_tables(&bytes).unwrap_or_else(|e| exit_with_error(&e.to_string()));
        for (i, table) in tables.iter().enumerate() {
            println!("\n--- Table {} ---", i + 1);
            for row in table {
                println!("| {} |", row.join(" | ").replace('\n', " / "));
            }
        }
    }
}

fn run_compile(template: PathBuf, output: String) {
    let start = Instant::now();
    let processor = TemplateProcessor::open(&template)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    processor
        .compiled()
        .save(&output)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    println!(
        "Compiled {} placeholder(s) and {} repeated row region(s) into '{}' in {:?}",
        processor.info().placeholders.len(),
        processor.info().regions.len(),
        output,
        start.elapsed()
    );
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
