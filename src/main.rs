// Tratamento de erros ergonômico
use anyhow::{Context, Result};

// Flag de execução compartilhada com o handler de Ctrl+C
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use std::time::Duration;

use pingrs_payload::{PayloadPinger, PingerConfig};

// Módulos locais
mod args;

/// Envia o payload em Echo Requests e imprime o que volta nas Echo Replies.
/// Sem privilégios usa o ping socket do kernel (Linux: net.ipv4.ping_group_range).
fn main() -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.format_timestamp_millis().init();

    let args = args::parse()?;

    // Configura handler para Ctrl+C
    let interrupted = Arc::new(AtomicBool::new(false));
    let i = interrupted.clone();
    ctrlc::set_handler(move || {
        i.store(true, Ordering::SeqCst);
    })
    .context("Erro ao configurar handler de Ctrl+C")?;

    // Espera de até 2s por resposta, como um ping comum
    let config = PingerConfig::default()
        .with_timeout(Duration::from_secs(2))
        .with_max_frames(32);
    let mut pinger = PayloadPinger::with_config(config).context("Falha ao criar socket ICMP")?;

    println!(
        "Enviando para {} com {} bytes de payload ({:?}):",
        args.dst,
        args.payload.len(),
        pinger.transport()
    );

    let mut transmitted = 0u64;
    let mut received = 0u64;

    loop {
        if interrupted.load(Ordering::SeqCst) {
            break;
        }
        if let Some(limit) = args.count {
            if transmitted >= limit {
                break;
            }
        }

        transmitted += 1;
        if !pinger.send(&args.dst, &args.payload) {
            println!("Falha ao enviar para {}", args.dst);
        } else {
            match pinger.read_cancellable(&interrupted) {
                Some(data) => {
                    received += 1;
                    println!(
                        "Resposta: bytes={} payload={}",
                        data.len(),
                        String::from_utf8_lossy(&data)
                    );
                }
                None => println!("Esgotado o tempo limite do pedido."),
            }
        }

        if interrupted.load(Ordering::SeqCst) {
            break;
        }
        // Não dorme depois do último
        if args.count.is_none_or(|limit| transmitted < limit) {
            std::thread::sleep(Duration::from_secs(1));
        }
    }

    println!("\n--- estatísticas para {} ---", args.dst);
    let loss = if transmitted > 0 {
        (transmitted - received) as f64 / transmitted as f64 * 100.0
    } else {
        0.0
    };
    println!(
        "{} pacotes transmitidos, {} recebidos, {:.0}% de perda de pacotes",
        transmitted, received, loss
    );

    Ok(())
}
