use tokio::{net::TcpListener, task::JoinHandle};

/// Accepts connections and never answers, so every request runs into the
/// client timeout. The sockets are held open to avoid a connection reset.
pub async fn stalled_server() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (url, handle)
}
