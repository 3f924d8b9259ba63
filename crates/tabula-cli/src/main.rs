use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tabula_lang::{tableau_matrix, Direction, Program};
use tabula_solver::{load_matrix, simple_solve, SolverError};

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "A two-phase simplex solver for linear programs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an LP file and print the optimum
    Solve {
        /// The file containing the linear program
        file: PathBuf,
        /// Also print the decision-variable values
        #[arg(short, long)]
        values: bool,
    },
    /// Check an LP file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Parse an LP file and dump the problem
    Parse {
        /// The file to parse
        file: PathBuf,
    },
}

fn read_source(file: &PathBuf) -> String {
    match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_source(source: &str) -> Program<f64> {
    match tabula_lang::Parser::parse(source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { file, values } => {
            let program = parse_source(&read_source(&file));

            let loaded = match load_matrix(tableau_matrix(&program)) {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Solver error: {}", e);
                    std::process::exit(1);
                }
            };
            let Some(sys) = loaded else {
                println!("Status: INFEASIBLE");
                println!("No solution satisfies all constraints.");
                std::process::exit(1);
            };

            match simple_solve(sys) {
                Ok((objective, sys)) => {
                    println!("Status: OPTIMAL");
                    let optimum = program.optimum_from(objective);
                    match program.direction {
                        Direction::Minimize => println!("Minimum: {}", optimum),
                        Direction::Maximize => println!("Maximum: {}", optimum),
                    }
                    if values {
                        println!();
                        println!("Variables:");
                        let solution = sys.variable_values(program.num_variables());
                        for (index, value) in solution.iter().enumerate() {
                            println!("  x{:<4} {:>12}", index + 1, value);
                        }
                    }
                }
                Err(SolverError::Unbounded) => {
                    println!("Status: UNBOUNDED");
                    println!("The problem has no finite optimal solution.");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Solver error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { file } => {
            let program = parse_source(&read_source(&file));
            let direction = match program.direction {
                Direction::Minimize => "minimize",
                Direction::Maximize => "maximize",
            };
            println!("{} is valid", file.display());
            println!("  direction: {}", direction);
            println!("  {} variables", program.num_variables());
            println!("  {} constraints", program.num_constraints());
        }
        Commands::Parse { file } => {
            let program = parse_source(&read_source(&file));
            println!("{:#?}", program);
        }
    }
}
