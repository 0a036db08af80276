// Struct containing the data from the command line arguments.
#[derive(Debug, Clone)]
pub(crate) struct ProgArgs {
    pub(crate) file: String,
    pub(crate) no_header: bool,
    pub(crate) command: Command,
}

// The operation to perform once the table has been built.
#[derive(Debug, Clone)]
pub(crate) enum Command {
    PrintColType(usize),
    RowAt(usize),
    Each(String),
    Filter(String),
    DropNa,
}

// Parses command line arguments for this binary.
impl From<Vec<String>> for ProgArgs {
    fn from(args: Vec<String>) -> Self {
        let mut file = None;
        let mut no_header = false;
        let mut command: Option<Command> = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-f" => {
                    i += 1;
                    match file {
                        None => file = Some(args[i].clone()),
                        Some(a) => panic!("file was already set to {}", a),
                    }
                }
                "-no-header" => {
                    no_header = true;
                }
                "-print-col-type" => {
                    i += 1;
                    let n = args[i].parse::<usize>().expect("expected a column index");
                    set_command(&mut command, Command::PrintColType(n));
                }
                "-row-at" => {
                    i += 1;
                    let n = args[i].parse::<usize>().expect("expected a row index");
                    set_command(&mut command, Command::RowAt(n));
                }
                "-each" => {
                    i += 1;
                    set_command(&mut command, Command::Each(args[i].clone()));
                }
                "-filter" => {
                    i += 1;
                    set_command(&mut command, Command::Filter(args[i].clone()));
                }
                "-drop-na" => {
                    set_command(&mut command, Command::DropNa);
                }
                other => panic!("unrecognized argument: {}", other),
            }
            i += 1;
        }

        match (file, command) {
            (Some(file), Some(command)) => ProgArgs {
                file,
                no_header,
                command,
            },
            _ => panic!("missing required arguments: -f <path> and one of -print-col-type/-row-at/-each/-filter/-drop-na"),
        }
    }
}

fn set_command(command: &mut Option<Command>, new: Command) {
    match command {
        None => *command = Some(new),
        Some(existing) => panic!("command was already set to {:?}", existing),
    }
}
