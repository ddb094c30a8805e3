//! Classify short messages as spam or not spam.

use std::error::Error;

use tabml::core::{FieldKind, Row, Schema};
use tabml::io::TextLoader;
use tabml::pipeline::{evaluate_binary, ExperimentConfig, FeaturizeText, Pipeline, Prediction, TrainerConfig};
use tabml::preprocessing::train_test_split;
use tabml_demos::{init_logging, load_config, percent};

const SAMPLES: [&str; 3] = [
    "If you can get the new revenue projections to me by Friday, I'll fold them into the forecast.",
    "Can you attend a meeting in Atlanta on the 16th? I'd like to get the team together to discuss in-person.",
    "Why pay more for expensive meds when you can order them online and save $$$?",
];

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let config = load_config(ExperimentConfig::new("data/ham-spam.csv", TrainerConfig::logistic()))?;

    let schema = Schema::new().label(0, FieldKind::Boolean).text(1, "Text");
    let data = TextLoader::new(schema)
        .delimiter(config.delimiter_byte()?)
        .has_header(config.has_header)
        .load(&config.path)?;
    let (train, test) = train_test_split(&data, config.test_fraction, config.seed)?;

    let pipeline = Pipeline::new()
        .append(FeaturizeText::new("Text", "Features"))
        .set_trainer(config.trainer.build(config.seed));

    println!("Training the model...");
    let model = pipeline.fit(&train)?;

    let metrics = evaluate_binary(&model, &test)?;
    println!();
    println!("Accuracy: {}", percent(metrics.accuracy));
    println!("AUC: {}", percent(metrics.auc));
    println!("AUPRC: {}", percent(metrics.auprc));
    println!("F1: {}", percent(metrics.f1));

    for sample in SAMPLES {
        let prediction = model.predict(&Row::new().with("Text", sample))?;
        if let Prediction::Binary { probability, label, .. } = prediction {
            println!();
            println!("{}", sample);
            println!("Spam score: {:.4}", probability);
            println!("Classification: {}", if label { "Spam" } else { "Not spam" });
        }
    }
    Ok(())
}
