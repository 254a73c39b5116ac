use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use classe_numerique::error::AppResult;
use classe_numerique::model::entity::{Exercise, UserEntity, UserEntityCreateUpdate};
use classe_numerique::model::{CrudRepository, DbConnection, ModelManager};
use classe_numerique::scoring::ExerciseContent;
use classe_numerique::web::dto::exercises::ExerciseBody;
use classe_numerique::web::{AuthenticatedUser, SubscriptionStatus, UserRole};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for administrating the Classe Numérique DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage library exercises
    Exercise {
        #[command(subcommand)]
        action: ExerciseCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// admin, teacher or student
        #[arg(long, default_value = "student")]
        role: String,
        /// Display name, defaults to the username
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        school_name: Option<String>,
        /// Approve a teacher right away
        #[arg(long, default_value_t = false)]
        approved: bool,
    },
}

/// Exercise management
#[derive(Subcommand, Debug)]
pub enum ExerciseCommands {
    /// Imports one exercise, or a list of them, from a JSON file
    Import {
        #[arg(long)]
        file: PathBuf,
        /// Author of the imported exercises
        #[arg(long)]
        teacher_email: String,
    },
    /// Validates exercises offline and prints what students get to see
    Check {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExerciseFile {
    Many(Vec<ExerciseBody>),
    One(ExerciseBody),
}

fn read_exercises(file: &Path) -> AppResult<Vec<ExerciseBody>> {
    let raw = std::fs::read_to_string(file)?;
    let exercises = match serde_json::from_str(&raw)? {
        ExerciseFile::Many(exercises) => exercises,
        ExerciseFile::One(exercise) => vec![exercise],
    };
    Ok(exercises)
}

async fn connect() -> AppResult<ModelManager> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => classe_numerique::Config::get_or_init(true)
            .await
            .app()
            .database_uri()
            .to_string(),
    };
    Ok(ModelManager::new(DbConnection::connect(&url)?))
}

fn check(file: &Path) -> AppResult<()> {
    let mut rng = rand::rng();

    for body in read_exercises(file)? {
        let mut content = ExerciseContent::parse(body.exercise_type, &body.content)?;
        content.prepare(&mut rng)?;

        println!("{} ({}): ok", body.title, body.exercise_type.label());
        println!("{}", serde_json::to_string_pretty(&content.student_view(&mut rng))?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add {
                username,
                email,
                password,
                role,
                name,
                school_name,
                approved,
            } => {
                let mm = connect().await?;
                let role = UserRole::from(role.as_str());
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        name: name.unwrap_or_else(|| username.clone()),
                        username,
                        email,
                        password_hash: classe_numerique::auth::hash_password(&password)?,
                        role,
                        school_name,
                    },
                )
                .await?;

                let user = if approved && role == UserRole::Teacher {
                    user.set_subscription(&mm, &actor, SubscriptionStatus::Approved, None)
                        .await?
                } else {
                    user
                };
                println!("User created: {:?}", user);
            }
        },

        Commands::Exercise { action } => match action {
            ExerciseCommands::Import {
                file,
                teacher_email,
            } => {
                let exercises = read_exercises(&file)?;
                let mm = connect().await?;

                let Some(teacher) = UserEntity::find_by_email(&mm, &actor, &teacher_email).await?
                else {
                    eprintln!("No user with email {teacher_email}");
                    std::process::exit(1);
                };
                let author = teacher.authenticated();

                for body in exercises {
                    let data = body.into_create(&mut rand::rng())?;
                    let exercise = Exercise::create(&mm, &author, data).await?;
                    println!("Exercise imported: {} ({})", exercise.title(), exercise.id());
                }
            }

            ExerciseCommands::Check { file } => check(&file)?,
        },
    }

    Ok(())
}
