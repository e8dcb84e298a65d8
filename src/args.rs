use anyhow::{Context, Result};

pub struct PingArgs {
    pub dst: String,
    pub count: Option<u64>,
    pub payload: Vec<u8>,
}

const USAGE: &str = "Uso: pingrs-payload <destino> [-c <count>] [-p <payload>]";

pub fn parse() -> Result<PingArgs> {
    parse_from(std::env::args().skip(1))
}

fn parse_from<I: IntoIterator<Item = String>>(args: I) -> Result<PingArgs> {
    let mut args = args.into_iter();
    let mut dst = None;
    let mut count = None;
    let mut payload = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" => {
                let v = args.next().context("Faltou o valor para -c")?;
                let c: u64 = v.parse().context("Valor inválido para -c")?;
                count = Some(c);
            }
            "-p" => {
                let v = args.next().context("Faltou o valor para -p")?;
                payload = Some(v.into_bytes());
            }
            _ => {
                if dst.is_none() {
                    dst = Some(arg);
                } else {
                    anyhow::bail!("Argumento inesperado: {}\n{}", arg, USAGE);
                }
            }
        }
    }

    let dst = dst.context(USAGE)?;
    let payload = payload.unwrap_or_else(|| b"pingrs-payload".to_vec());

    Ok(PingArgs { dst, count, payload })
}
