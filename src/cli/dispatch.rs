use anyhow::Result;
use clap::CommandFactory;
use tristep::commands::{
    autolabel, classes, completions, download, init, label, partition, predict, settings, status,
    three_step, train,
};

use super::types::{ClassesCommands, Cli, Commands, LabelCommands, ThreeStepCommands};

pub fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Init { path } => init::execute(path),
        Commands::Status { dataset, json } => status::execute(dataset, json),
        Commands::Classes { command } => match command {
            ClassesCommands::List => classes::list(),
            ClassesCommands::Add { name } => classes::add(name),
            ClassesCommands::Remove { name } => classes::remove(name),
            ClassesCommands::Select { name } => classes::select(name),
        },
        Commands::Download {
            subreddit,
            limit,
            class_name,
            output,
        } => download::execute(subreddit, limit, class_name, output),
        Commands::Split {
            source,
            dest,
            class_name,
            count,
        } => partition::split_images(source, dest, class_name, count),
        Commands::Merge {
            base,
            class_name,
            output,
        } => partition::merge_slices(base, class_name, output),
        Commands::Label { command } => match command {
            LabelCommands::Show { image } => label::show(image),
            LabelCommands::Save { image, boxes } => label::save(image, boxes),
        },
        Commands::Autolabel {
            images,
            dataset,
            model,
            replace,
        } => autolabel::execute(images, dataset, model, replace),
        Commands::Train {
            dataset,
            epochs,
            batch,
            img,
        } => train::execute(dataset, epochs, batch, img),
        Commands::Predict { model, image, conf } => predict::execute(model, image, conf),
        Commands::ThreeStep { command } => match command {
            ThreeStepCommands::Enable => three_step::enable(),
            ThreeStepCommands::Disable => three_step::disable(),
            ThreeStepCommands::Status => three_step::status(),
            ThreeStepCommands::Advance => three_step::advance(),
            ThreeStepCommands::Resume => three_step::resume(),
        },
        Commands::Settings { admin, language } => settings::execute(admin, language),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            completions::execute(&mut cmd, shell);
            Ok(())
        }
    }
}
