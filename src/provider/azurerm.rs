use super::IconCatalog;

/// Azure resources drawn as diagram nodes, with their icons
static RESOURCES: &[(&str, &str)] = &[
    ("azurerm_aadb2c_directory", "https://icons.terrastruct.com/azure%2FIdentity%20Service%20Color%2FAzure%20AD%20B2C.svg"),
    ("azurerm_resource_group", "https://icons.terrastruct.com/azure%2FGeneral%20Service%20Icons%2FResource%20Groups.svg"),
    ("azurerm_virtual_network", "https://icons.terrastruct.com/azure%2FNetworking%20Service%20Color%2FVirtual%20Networks.svg"),
    ("azurerm_subnet", "https://icons.terrastruct.com/azure%2FNetworking%20Service%20Color%2FVirtual%20Networks%20(Classic).svg"),
    ("azurerm_lb", "https://icons.terrastruct.com/azure%2FNetworking%20Service%20Color%2FLoad%20Balancers.svg"),
    ("azurerm_application_gateway", "https://icons.terrastruct.com/azure%2FNetworking%20Service%20Color%2FApplication%20Gateway.svg"),
    ("azurerm_linux_virtual_machine", "https://icons.terrastruct.com/azure%2FCompute%20Service%20Color%2FVM%2FVM-Linux.svg"),
    ("azurerm_windows_virtual_machine", "https://icons.terrastruct.com/azure%2FCompute%20Service%20Color%2FVM%2FVM-Windows.svg"),
    ("azurerm_kubernetes_cluster", "https://icons.terrastruct.com/azure%2FContainer%20Service%20Color%2FKubernetes%20Services.svg"),
    ("azurerm_storage_account", "https://icons.terrastruct.com/azure%2FStorage%20Service%20Color%2FStorage%20Accounts.svg"),
    ("azurerm_mssql_server", "https://icons.terrastruct.com/azure%2FDatabases%20Service%20Color%2FSQL%20Servers.svg"),
];

/// Icon catalog for the `azurerm` provider
pub struct AzureCatalog;

impl IconCatalog for AzureCatalog {
    fn prefix(&self) -> &'static str {
        "azurerm"
    }

    fn entries(&self) -> &'static [(&'static str, &'static str)] {
        RESOURCES
    }
}
