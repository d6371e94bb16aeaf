//! The `ldscreen intake` and `ldscreen predict` commands.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use ldscreen_core::model::IntakeForm;

use super::open_engine;

pub fn intake(config: Option<PathBuf>, user: String, form: IntakeForm) -> Result<()> {
    let (_, engine) = open_engine(config)?;
    let profile = engine.record_intake(&user, form, Utc::now())?;
    println!("Recorded intake {}", profile.id);
    Ok(())
}

pub fn predict(config: Option<PathBuf>, user: String, intake: Option<Uuid>) -> Result<()> {
    let (_, mut engine) = open_engine(config)?;
    engine.load_model()?;

    let now = Utc::now();
    let prediction = match intake {
        Some(id) => engine.predict_for(&user, id, now)?,
        None => engine.predict_latest(&user, now)?,
    };

    println!("Prediction: {}", prediction.label);
    println!("Probability (LD): {:.2}", prediction.probability);
    println!("Model: {}", prediction.model_identifier);
    Ok(())
}
