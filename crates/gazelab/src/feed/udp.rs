use super::SharedGaze;
use crate::error::Result;
use crate::types::PixelPoint;
use serde::Deserialize;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Deserialize)]
struct JsonGazeMsg {
    x: f64,
    y: f64,
}

/// Parse one datagram into a viewport pixel position.
///
/// Accepts `{"x":512,"y":300.5}` or `x=512 y=300.5`.
pub fn parse_gaze_message(msg: &str) -> Option<PixelPoint> {
    let msg = msg.trim();
    if msg.is_empty() {
        return None;
    }

    if msg.starts_with('{') {
        let j = serde_json::from_str::<JsonGazeMsg>(msg).ok()?;
        return finite(PixelPoint::new(j.x, j.y));
    }

    let mut x: Option<f64> = None;
    let mut y: Option<f64> = None;

    for tok in msg.split_whitespace() {
        let (k, v) = tok.split_once('=')?;
        match k {
            "x" => x = v.parse().ok(),
            "y" => y = v.parse().ok(),
            _ => {}
        }
    }

    finite(PixelPoint::new(x?, y?))
}

fn finite(p: PixelPoint) -> Option<PixelPoint> {
    (p.x.is_finite() && p.y.is_finite()).then_some(p)
}

/// Bind a UDP listener that keeps `gaze` current and optionally forwards
/// every parsed point. Returns the bound address.
pub async fn spawn_udp_gaze_task(
    bind_addr: SocketAddr,
    gaze: SharedGaze,
    forward: Option<UnboundedSender<PixelPoint>>,
) -> Result<SocketAddr> {
    let sock = UdpSocket::bind(bind_addr).await?;
    let local = sock.local_addr()?;
    log::info!("UDP gaze listener bound on {local}");

    tokio::spawn(async move {
        let mut buf = [0u8; 2048];
        loop {
            let (len, _src) = match sock.recv_from(&mut buf).await {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("UDP gaze recv error: {e}");
                    continue;
                }
            };

            let Some(point) = std::str::from_utf8(&buf[..len]).ok().and_then(parse_gaze_message) else {
                log::debug!("Ignoring malformed gaze datagram ({len} bytes)");
                continue;
            };

            gaze.update(point);
            if let Some(tx) = &forward {
                if tx.send(point).is_err() {
                    log::debug!("Gaze forward channel closed");
                }
            }
        }
    });

    Ok(local)
}
