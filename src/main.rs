use ansible_relay::cli::AdHocArgs;

fn main() -> anyhow::Result<()> {
    let code = ansible_relay::run::<AdHocArgs>()?;
    std::process::exit(code)
}
