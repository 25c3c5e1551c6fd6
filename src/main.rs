use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use clap_verbosity_flag::{Level, Verbosity};
use nib4_sim::{
    assemble,
    framework::CpuSim,
    isa::{self, Addr, Word},
    logging_setup, mem_diff, mem_print, parse_literal, AssembleOption, Object, Processor,
};

fn parse_expect(s: &str) -> Result<(Addr, Word), String> {
    let (addr, val) = s
        .split_once('=')
        .ok_or_else(|| format!("expect ADDR=VALUE, found `{s}`"))?;
    let field = |v: &str| match parse_literal(v.trim()) {
        Some(n) if n < 16 => Ok(n as u8),
        _ => Err(format!("`{v}` is not a 4-bit number")),
    };
    Ok((field(addr)?, field(val)?))
}

// 4-bit load-store processor assembler and cycle-level simulator
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    arg_required_else_help = true,
)]
struct Args {
    /// Path to the input assembly file (or a .mem image with `--run`)
    input: String,

    /// Output filename (default is input%.mem)
    ///
    /// Specify this option to write the assembled program to a file. This
    /// option is conflict with `run`.
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Run the program on the cycle-level processor
    #[arg(long)]
    run: bool,

    /// Give up after this many clock cycles
    #[arg(long, default_value_t = 1000)]
    max_cycles: u64,

    /// Write logs as JSON lines into this file
    #[arg(long)]
    trace: Option<String>,

    /// Print the waveform table after the run
    #[arg(long)]
    wave: bool,

    /// Print the whole data memory after the run
    #[arg(long)]
    dump: bool,

    /// Check a memory cell after the run, e.g. `--expect 4=0xb`
    #[arg(long, value_parser = parse_expect)]
    expect: Vec<(Addr, Word)>,

    #[command(flatten)]
    verbose: Verbosity,
}

fn load(path: &str, verbose: bool) -> Result<Object> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("could not read file `{}`", path))?;
    if path.ends_with(".mem") {
        Object::from_mem_image(&content).with_context(|| format!("invalid image `{}`", path))
    } else {
        assemble(&content, AssembleOption::default().set_verbose(verbose))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose.log_level() {
        Some(Level::Error) => &tracing::Level::WARN,
        Some(Level::Warn) => &tracing::Level::INFO,
        Some(Level::Info) => &tracing::Level::DEBUG,
        Some(Level::Debug) => &tracing::Level::TRACE,
        Some(Level::Trace) => &tracing::Level::TRACE,
        None => &tracing::Level::ERROR,
    };
    let trace_file = match &args.trace {
        Some(path) => Some(
            std::fs::File::create(path)
                .with_context(|| format!("could not create file `{}`", path))?,
        ),
        None => None,
    };
    logging_setup(log_level, trace_file);

    let verbose_asm = args
        .verbose
        .log_level()
        .is_some_and(|lv| lv >= Level::Debug);
    let obj = load(&args.input, verbose_asm)?;

    if args.run {
        if args.output.is_some() {
            let mut cmd = Args::command();
            cmd.error(
                ErrorKind::ArgumentConflict,
                "Can't both specify output and run",
            )
            .exit();
        }
        let mut cpu = Processor::from_object(&obj)?;
        if args.wave {
            cpu.enable_recording();
        }
        let cycles = cpu.run(args.max_cycles).context("program did not finish")?;

        mem_diff(&obj.init_mem(), &cpu.mem());
        println!("finished in {} cycles", cycles);
        print!("{}", cpu);
        if let Some(recorder) = cpu.recorder() {
            print!("{}", recorder);
        }
        if args.dump {
            mem_print(&cpu.mem());
        }

        let answer = isa::simulate(&obj.program, obj.init_mem(), false)?;
        if answer.mem != cpu.mem() {
            mem_diff(&answer.mem, &cpu.mem());
            anyhow::bail!("memory differs from the instruction-level model");
        }
        let mem = cpu.mem();
        for (addr, val) in args.expect {
            let got = mem[addr as usize];
            anyhow::ensure!(
                got == val,
                "M[{:#x}] = {:#x}, expected {:#x}",
                addr,
                got,
                val
            );
        }
    } else {
        anyhow::ensure!(
            !args.input.ends_with(".mem"),
            "`{}` is already a .mem image",
            args.input
        );
        let output_path = match args.output {
            Some(path) => std::path::PathBuf::from(path),
            None => std::path::PathBuf::from(&args.input).with_extension("mem"),
        };
        eprint!("{}", obj);
        std::fs::write(&output_path, obj.to_mem_image())
            .with_context(|| format!("could not write file `{}`", output_path.display()))?;
    }
    Ok(())
}
