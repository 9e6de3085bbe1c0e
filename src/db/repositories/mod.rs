mod tours;
