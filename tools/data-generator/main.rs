use clap::Parser;
use jiaoan::schema::{ACTIVITIES_KEY, LEGACY_ACTIVITY_INTENT, REFLECTIONS_KEY};
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;
use rand::{Rng, rng};
use serde_json::{Map, Value, json};
use std::fs;

/// A CLI tool to generate teaching-design payloads for exercising the renderer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_payload.json")]
    output: String,

    /// The minimum number of learning activities to generate
    #[arg(long, default_value_t = 0)]
    min: usize,

    /// The maximum number of learning activities to generate
    #[arg(long, default_value_t = 6)]
    max: usize,

    /// Emit the retired revision-1 shape (one document-level activity_intent)
    #[arg(long)]
    legacy: bool,

    /// Probability that an activity is emitted without its activity_intent
    #[arg(long, default_value_t = 0.0)]
    drop_intent_rate: f64,
}

const SUBJECTS: &[(&str, &str)] = &[
    ("语文", "春"),
    ("数学", "角的初步认识"),
    ("英语", "My Family"),
    ("物理", "浮力"),
    ("生物", "细胞的结构"),
];

const GRADES: &[&str] = &["小学二年级", "小学五年级", "初中一年级", "初中二年级", "高中一年级"];

const STAGES: &[&str] = &["情境导入", "新知探究", "合作交流", "巩固练习", "总结拓展", "迁移运用"];

const POINT_TYPES: &[&str] = &["认知冲突", "思维图示", "变式运用"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rng();

    if cli.min > cli.max {
        eprintln!(
            "Error: --min ({}) cannot be greater than --max ({})",
            cli.min, cli.max
        );
        std::process::exit(1);
    }
    if !(0.0..=1.0).contains(&cli.drop_intent_rate) {
        eprintln!("Error: --drop-intent-rate must be between 0 and 1");
        std::process::exit(1);
    }

    println!(
        "Generating a teaching-design payload ({} to {} activities)...",
        cli.min, cli.max
    );

    let mut payload = generate_scalars(&mut rng);
    let count = rng.random_range(cli.min..=cli.max);
    let activities = generate_activities(&mut rng, count, cli.legacy, cli.drop_intent_rate);
    payload.insert(ACTIVITIES_KEY.to_string(), Value::Array(activities));
    payload.insert(
        REFLECTIONS_KEY.to_string(),
        Value::Array(generate_points(&mut rng)),
    );
    if cli.legacy {
        payload.insert(
            LEGACY_ACTIVITY_INTENT.to_string(),
            json!("通过层层递进的活动发展学生的思维能力。"),
        );
        println!("-> Using the legacy document-level activity_intent.");
    }

    let json_output = serde_json::to_string_pretty(&Value::Object(payload))?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated {} activit(ies) and saved the payload to '{}'",
        count, cli.output
    );

    Ok(())
}

fn generate_scalars(rng: &mut ThreadRng) -> Map<String, Value> {
    let &(subject, lesson) = SUBJECTS.choose(rng).unwrap_or(&SUBJECTS[0]);
    let grade = GRADES.choose(rng).copied().unwrap_or(GRADES[0]);
    let period = rng.random_range(1..=3);

    let value = json!({
        "lesson_name": lesson,
        "grade_level": grade,
        "subject": subject,
        "textbook_version": "人教版",
        "lesson_period": format!("第{}课时", period),
        "teacher_school": "实验学校",
        "teacher_name": "王老师",
        "summary": format!("本课以《{}》为载体，通过问题驱动发展学生的{}思维。", lesson, subject),
        "content_analysis": format!("《{}》是本单元的核心内容。", lesson),
        "learner_analysis": format!("{}学生已具备初步的观察和表达能力。", grade),
        "learning_objectives": "1. 理解核心概念（重点）\n2. 能迁移运用（难点）\n3. 乐于合作交流",
        "lesson_structure": "导入→新知探究→巩固练习→总结与拓展",
        "blackboard_design": format!("{}\n关键词 → 图示 → 小结", lesson),
        "homework_extension": "完成学习单，并与家人分享本课收获。",
        "materials_design": "学习单一份",
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn generate_activities(
    rng: &mut ThreadRng,
    count: usize,
    legacy: bool,
    drop_rate: f64,
) -> Vec<Value> {
    let mut dropped = 0;
    let activities: Vec<Value> = (0..count)
        .map(|i| {
            let stage = STAGES[i % STAGES.len()];
            let mut activity = json!({
                "name": format!("{}（{}）", stage, i + 1),
                "teacher_activity": format!("教师组织{}，出示任务{}。", stage, rng.random_range(1..=9)),
                "student_activity": format!("学生围绕任务{}开展思考与交流。", i + 1),
            });
            let keep_intent = !legacy && !rng.random_bool(drop_rate);
            if keep_intent {
                let intent = format!("通过{}帮助学生达成第{}个学习目标。", stage, i % 3 + 1);
                activity["activity_intent"] = json!(intent);
            } else {
                dropped += 1;
            }
            activity
        })
        .collect();
    if dropped > 0 && !legacy {
        println!("-> Left out activity_intent in {} activit(ies).", dropped);
    }
    activities
}

fn generate_points(rng: &mut ThreadRng) -> Vec<Value> {
    let count = rng.random_range(0..=POINT_TYPES.len());
    POINT_TYPES[..count]
        .iter()
        .map(|point_type| {
            json!({
                "point_type": point_type,
                "description": format!("围绕{}设计{}个问题。", point_type, rng.random_range(1..=3)),
            })
        })
        .collect()
}
