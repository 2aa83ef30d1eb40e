use std::sync::Arc;

use tracing::{error, info};

use crate::backend::{MemoryBackend, ObjectStore, RecordStore, SupabaseBackend};
use crate::config::BackendChoice;
use crate::controller::FormController;
use crate::repository::UserRepository;
use crate::uploader::ImageUploader;

/// The running application: the form controller wired to its backend.
///
/// Responsible for starting the in-memory backend actor when one is used, and for
/// waiting on it at shutdown.
pub struct FormSystem {
    pub controller: FormController,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl FormSystem {
    pub fn new(choice: BackendChoice) -> Result<Self, String> {
        let mut handles = Vec::new();

        let (objects, records): (Arc<dyn ObjectStore>, Arc<dyn RecordStore>) = match choice {
            BackendChoice::Hosted(config) => {
                info!(url = %config.url, bucket = %config.bucket, table = %config.table, "Using hosted backend");
                let backend = Arc::new(SupabaseBackend::new(config).map_err(|e| e.to_string())?);
                (backend.clone(), backend)
            }
            BackendChoice::Memory { bucket } => {
                info!(bucket = %bucket, "Using in-memory backend");
                let (actor, client) = MemoryBackend::new(32, bucket);
                handles.push(tokio::spawn(actor.run()));
                let client = Arc::new(client);
                (client.clone(), client)
            }
        };

        let controller = FormController::new(ImageUploader::new(objects), UserRepository::new(records));
        Ok(Self { controller, handles })
    }

    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down...");
        // Dropping the controller drops the last backend handles, which stops the actor.
        drop(self.controller);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Backend task failed: {:?}", e);
                return Err(format!("Backend task failed: {:?}", e));
            }
        }

        info!("Shutdown complete.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Field;

    #[tokio::test]
    async fn test_memory_system_starts_and_stops() {
        let mut system = FormSystem::new(BackendChoice::Memory { bucket: "avatars".to_string() }).unwrap();
        system.controller.set_field(Field::Username, "alice");
        system.controller.set_field(Field::Email, "a@x.com");
        let alert = system.controller.create().await;
        assert_eq!(alert.message, "User created!");

        system.shutdown().await.unwrap();
    }
}
