use super::IconCatalog;

/// Google Cloud resources drawn as diagram nodes, with their icons
static RESOURCES: &[(&str, &str)] = &[
    ("google_compute_network", "https://icons.terrastruct.com/gcp%2FProducts%20and%20services%2FNetworking%2FVirtual%20Private%20Cloud.svg"),
    ("google_compute_subnetwork", "https://icons.terrastruct.com/gcp%2FProducts%20and%20services%2FNetworking%2FVirtual%20Private%20Cloud.svg"),
    ("google_compute_instance", "https://icons.terrastruct.com/gcp%2FProducts%20and%20services%2FCompute%2FCompute%20Engine.svg"),
    ("google_compute_forwarding_rule", "https://icons.terrastruct.com/gcp%2FProducts%20and%20services%2FNetworking%2FCloud%20Load%20Balancing.svg"),
    ("google_container_cluster", "https://icons.terrastruct.com/gcp%2FProducts%20and%20services%2FCompute%2FKubernetes%20Engine.svg"),
    ("google_cloud_run_service", "https://icons.terrastruct.com/gcp%2FProducts%20and%20services%2FCompute%2FCloud%20Run.svg"),
    ("google_cloudfunctions_function", "https://icons.terrastruct.com/gcp%2FProducts%20and%20services%2FCompute%2FCloud%20Functions.svg"),
    ("google_storage_bucket", "https://icons.terrastruct.com/gcp%2FProducts%20and%20services%2FStorage%2FCloud%20Storage.svg"),
    ("google_sql_database_instance", "https://icons.terrastruct.com/gcp%2FProducts%20and%20services%2FDatabases%2FCloud%20SQL.svg"),
    ("google_pubsub_topic", "https://icons.terrastruct.com/gcp%2FProducts%20and%20services%2FData%20Analytics%2FCloud%20PubSub.svg"),
];

/// Icon catalog for the `google` provider
pub struct GoogleCatalog;

impl IconCatalog for GoogleCatalog {
    fn prefix(&self) -> &'static str {
        "google"
    }

    fn entries(&self) -> &'static [(&'static str, &'static str)] {
        RESOURCES
    }
}
